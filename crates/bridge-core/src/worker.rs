//! Per-direction settlement loop.

use crate::{unix_now, SwapProcessor};
use bridge_storage::SwapStore;
use bridge_types::{SwapDirection, SwapStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Counts from a single settlement cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
	/// Pending intents returned by the store.
	pub found: usize,
	/// Intents broadcast during this cycle.
	pub settled: usize,
	/// Intents that turned out to be settled already.
	pub skipped: usize,
	pub failed: usize,
}

/// Polls the store for pending intents of one direction and settles them one
/// at a time, oldest first.
pub struct SettlementLoop {
	direction: SwapDirection,
	store: Arc<dyn SwapStore>,
	processor: SwapProcessor,
	poll_interval: Duration,
	max_settle_lifetime: Duration,
	started: AtomicBool,
}

impl SettlementLoop {
	pub fn new(
		store: Arc<dyn SwapStore>,
		processor: SwapProcessor,
		poll_interval: Duration,
		max_settle_lifetime: Duration,
	) -> Self {
		Self {
			direction: processor.direction(),
			store,
			processor,
			poll_interval,
			max_settle_lifetime,
			started: AtomicBool::new(false),
		}
	}

	pub fn direction(&self) -> SwapDirection {
		self.direction
	}

	pub fn is_running(&self) -> bool {
		self.started.load(Ordering::SeqCst)
	}

	/// Runs settlement cycles forever. Only the first call does anything.
	pub async fn run(&self) {
		if self
			.started
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			warn!("{} settlement loop already running", self.direction);
			return;
		}

		info!(
			"Starting {} settlement loop (poll every {:?})",
			self.direction, self.poll_interval
		);

		loop {
			let report = self.run_cycle().await;
			if report.found > 0 {
				info!(
					"{} cycle: {} found, {} settled, {} skipped, {} failed",
					self.direction, report.found, report.settled, report.skipped, report.failed
				);
			}
			tokio::time::sleep(self.poll_interval).await;
		}
	}

	/// Runs a single settlement cycle over the currently pending intents.
	pub async fn run_cycle(&self) -> CycleReport {
		let since = unix_now().saturating_sub(self.max_settle_lifetime.as_secs());

		let intents = match self
			.store
			.find_pending(self.direction, SwapStatus::NotSettled, since)
			.await
		{
			Ok(intents) => intents,
			Err(e) => {
				error!("Failed to query pending {} swaps: {}", self.direction, e);
				Vec::new()
			}
		};

		let mut report = CycleReport {
			found: intents.len(),
			..Default::default()
		};

		for intent in &intents {
			match self.processor.process(intent).await {
				Ok(hash) => {
					debug!("{} swap {} broadcast as {}", self.direction, intent.id, hash);
					report.settled += 1;
				}
				Err(e) if e.is_already_settled() => {
					info!("{} swap {}: {}", self.direction, intent.id, e);
					report.skipped += 1;
				}
				Err(e) => {
					error!("{} swap {} failed: {}", self.direction, intent.id, e);
					report.failed += 1;
				}
			}
		}

		report
	}
}
