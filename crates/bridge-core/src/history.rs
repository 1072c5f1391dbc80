//! Bounded in-memory record of recently signed settlements.
//!
//! The history is written before a settlement is persisted and broadcast, so
//! it can still vouch for a settlement whose durable record was lost or is
//! lagging. It is advisory only and does not survive a restart.

use bridge_types::{SwapDirection, TransactionHash, U256};
use std::collections::VecDeque;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
	pub id: String,
	pub direction: SwapDirection,
	pub value: U256,
	pub settlement_tx: TransactionHash,
}

/// Insertion-ordered history holding at most `capacity` entries.
pub struct SwapHistory {
	capacity: usize,
	entries: RwLock<VecDeque<HistoryEntry>>,
}

impl SwapHistory {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			entries: RwLock::new(VecDeque::with_capacity(capacity)),
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Appends an entry, evicting the oldest one when full.
	pub async fn record(
		&self,
		id: &str,
		direction: SwapDirection,
		value: U256,
		settlement_tx: TransactionHash,
	) {
		if self.capacity == 0 {
			return;
		}

		let mut entries = self.entries.write().await;
		if entries.len() >= self.capacity {
			entries.pop_front();
		}
		entries.push_back(HistoryEntry {
			id: id.to_string(),
			direction,
			value,
			settlement_tx,
		});
	}

	/// Returns the most recent entry for the swap, if any.
	pub async fn lookup(&self, id: &str, direction: SwapDirection) -> Option<HistoryEntry> {
		self.entries
			.read()
			.await
			.iter()
			.rev()
			.find(|entry| entry.id == id && entry.direction == direction)
			.cloned()
	}

	pub async fn len(&self) -> usize {
		self.entries.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.is_empty()
	}
}
