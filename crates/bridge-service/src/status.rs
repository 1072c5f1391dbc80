//! Settlement status report read straight from the swap store.

use bridge_storage::{StorageError, SwapStore};
use bridge_types::{SwapDirection, SwapStatus};
use std::fmt::Write;

/// Intent counts for one direction.
#[derive(Debug, PartialEq, Eq)]
pub struct DirectionStatus {
	pub direction: SwapDirection,
	pub not_settled: usize,
	pub processed: usize,
	pub settle_failed: usize,
	/// Failed intents with the reason recorded alongside, awaiting manual
	/// remediation.
	pub failures: Vec<(String, String)>,
}

/// Counts intents recorded at or after `since`, per direction and status.
pub async fn collect(
	store: &dyn SwapStore,
	since: u64,
) -> Result<Vec<DirectionStatus>, StorageError> {
	let mut report = Vec::new();

	for direction in SwapDirection::ALL {
		let mut status = DirectionStatus {
			direction,
			not_settled: 0,
			processed: 0,
			settle_failed: 0,
			failures: Vec::new(),
		};

		for swap_status in SwapStatus::ALL {
			let intents = store.find_pending(direction, swap_status, since).await?;
			match swap_status {
				SwapStatus::NotSettled => status.not_settled = intents.len(),
				SwapStatus::Processed => status.processed = intents.len(),
				SwapStatus::SettleFailed => {
					status.settle_failed = intents.len();
					status.failures = intents
						.into_iter()
						.map(|intent| (intent.id, intent.memo))
						.collect();
				}
			}
		}

		report.push(status);
	}

	Ok(report)
}

pub fn render(report: &[DirectionStatus]) -> String {
	let mut out = String::new();

	for status in report {
		let _ = writeln!(
			out,
			"{:<9} not_settled={} processed={} settle_failed={}",
			status.direction.as_str(),
			status.not_settled,
			status.processed,
			status.settle_failed
		);
		for (id, reason) in &status.failures {
			let _ = writeln!(out, "  failed {} {}", id, reason);
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_storage::implementations::memory::MemoryStorage;
	use bridge_storage::{KvSwapStore, StorageService};
	use bridge_types::{SwapIntent, SwapResult};

	#[tokio::test]
	async fn test_collect_and_render() {
		let store = KvSwapStore::new(StorageService::new(Box::new(MemoryStorage::new())));
		for (id, direction, created_at) in [
			("tx1", SwapDirection::Inbound, 100),
			("tx2", SwapDirection::Inbound, 100),
			("tx3", SwapDirection::Outbound, 100),
			("old", SwapDirection::Outbound, 1),
		] {
			store
				.register_swap(
					&SwapIntent::new(id, direction, created_at),
					&SwapResult::new(id, direction, "addrA", "1"),
				)
				.await
				.unwrap();
		}
		store
			.update_intent_status("tx1", SwapDirection::Inbound, SwapStatus::Processed, 101, "")
			.await
			.unwrap();
		store
			.update_intent_status(
				"tx3",
				SwapDirection::Outbound,
				SwapStatus::SettleFailed,
				101,
				"nonce too low",
			)
			.await
			.unwrap();

		let report = collect(&store, 50).await.unwrap();
		assert_eq!(report.len(), 2);

		assert_eq!(report[0].direction, SwapDirection::Inbound);
		assert_eq!(report[0].not_settled, 1);
		assert_eq!(report[0].processed, 1);
		assert_eq!(report[0].settle_failed, 0);

		assert_eq!(report[1].not_settled, 0);
		assert_eq!(report[1].settle_failed, 1);
		assert_eq!(
			report[1].failures,
			vec![("tx3".to_string(), "nonce too low".to_string())]
		);

		let text = render(&report);
		assert!(text.contains("inbound   not_settled=1 processed=1 settle_failed=0"));
		assert!(text.contains("  failed tx3 nonce too low"));
	}
}
