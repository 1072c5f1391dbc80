//! Swap store backed by the key-value [`StorageService`].
//!
//! Intents and results live in per-direction namespaces. Each intent also has
//! a small entry under a per-direction, per-status index namespace, so that a
//! scan for pending work never reads intents that have already settled.
//! Updates are read-modify-write and assume a single writer per intent.

use crate::{StorageError, StorageService, SwapStore};
use async_trait::async_trait;
use bridge_types::{ResultUpdate, SwapDirection, SwapIntent, SwapResult, SwapStatus};
use serde::{Deserialize, Serialize};

fn intent_namespace(direction: SwapDirection) -> String {
	format!("intent:{}", direction)
}

fn result_namespace(direction: SwapDirection) -> String {
	format!("result:{}", direction)
}

fn status_namespace(direction: SwapDirection, status: SwapStatus) -> String {
	format!("status:{}:{}", direction, status)
}

/// Index entry pointing at an intent with a given status.
#[derive(Debug, Serialize, Deserialize)]
struct StatusEntry {
	id: String,
	created_at: u64,
}

impl StatusEntry {
	fn of(intent: &SwapIntent) -> Self {
		Self {
			id: intent.id.clone(),
			created_at: intent.created_at,
		}
	}
}

/// [`SwapStore`] implementation over any storage backend.
///
/// Intents are never deleted. A pending scan lists only the status index of
/// the requested direction and status, then loads the matching intents, so
/// its cost follows the number of intents in that status rather than every
/// intent ever recorded. Index entries are written before the intent they
/// describe and removed after it, so a crash can leave a stale entry but
/// never hide an intent. Stale entries are skipped when scanning.
pub struct KvSwapStore {
	storage: StorageService,
}

impl KvSwapStore {
	pub fn new(storage: StorageService) -> Self {
		Self { storage }
	}

	/// Records a newly detected swap. Fails if the intent is already known.
	pub async fn register_swap(
		&self,
		intent: &SwapIntent,
		result: &SwapResult,
	) -> Result<(), StorageError> {
		if intent.id != result.id || intent.direction != result.direction {
			return Err(StorageError::Backend(format!(
				"intent {} ({}) and result {} ({}) do not match",
				intent.id, intent.direction, result.id, result.direction
			)));
		}

		let namespace = intent_namespace(intent.direction);
		if self.storage.contains(&namespace, &intent.id).await? {
			return Err(StorageError::AlreadyExists(format!(
				"{} swap {}",
				intent.direction, intent.id
			)));
		}

		// Result first so a visible intent always has its result
		self.storage
			.store(&result_namespace(result.direction), &result.id, result)
			.await?;
		self.storage
			.store(
				&status_namespace(intent.direction, intent.status),
				&intent.id,
				&StatusEntry::of(intent),
			)
			.await?;
		self.storage.store(&namespace, &intent.id, intent).await
	}

	/// Loads a single intent.
	pub async fn find_intent(
		&self,
		id: &str,
		direction: SwapDirection,
	) -> Result<SwapIntent, StorageError> {
		self.storage.retrieve(&intent_namespace(direction), id).await
	}
}

#[async_trait]
impl SwapStore for KvSwapStore {
	async fn find_pending(
		&self,
		direction: SwapDirection,
		status: SwapStatus,
		since: u64,
	) -> Result<Vec<SwapIntent>, StorageError> {
		let mut entries: Vec<StatusEntry> = self
			.storage
			.list::<StatusEntry>(&status_namespace(direction, status))
			.await?
			.into_iter()
			.filter(|entry| entry.created_at >= since)
			.collect();

		entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

		let namespace = intent_namespace(direction);
		let mut intents = Vec::with_capacity(entries.len());
		for entry in entries {
			match self.storage.retrieve::<SwapIntent>(&namespace, &entry.id).await {
				Ok(intent) if intent.status == status => intents.push(intent),
				// Left behind by an interrupted write
				Ok(_) | Err(StorageError::NotFound(_)) => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(intents)
	}

	async fn find_result(
		&self,
		id: &str,
		direction: SwapDirection,
	) -> Result<SwapResult, StorageError> {
		self.storage.retrieve(&result_namespace(direction), id).await
	}

	async fn update_intent_status(
		&self,
		id: &str,
		direction: SwapDirection,
		status: SwapStatus,
		timestamp: u64,
		memo: &str,
	) -> Result<(), StorageError> {
		let namespace = intent_namespace(direction);
		let mut intent: SwapIntent = self.storage.retrieve(&namespace, id).await?;
		let previous = intent.status;

		intent.status = status;
		intent.timestamp = timestamp;
		intent.memo = memo.to_string();

		if previous != status {
			self.storage
				.store(
					&status_namespace(direction, status),
					id,
					&StatusEntry::of(&intent),
				)
				.await?;
		}
		self.storage.store(&namespace, id, &intent).await?;
		if previous != status {
			self.storage
				.remove(&status_namespace(direction, previous), id)
				.await?;
		}
		Ok(())
	}

	async fn update_result(
		&self,
		id: &str,
		direction: SwapDirection,
		update: ResultUpdate,
	) -> Result<(), StorageError> {
		let namespace = result_namespace(direction);
		let mut result: SwapResult = self.storage.retrieve(&namespace, id).await?;

		result.apply(update);

		self.storage.store(&namespace, id, &result).await
	}
}
