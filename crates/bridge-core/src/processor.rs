//! Settlement of a single swap intent.
//!
//! Settlement is idempotent per intent. A settlement transaction is remembered
//! in the [`SwapHistory`] and persisted before it is broadcast, and an intent
//! whose result already carries a settlement hash is never processed again.
//! Failures before anything is persisted leave the intent pending, failures
//! after it are terminal.

use crate::fees::{calc_swapped_value, fee_for_endpoint, FeeSchedule, SwapFeeConfig};
use crate::{unix_now, SettleError, SwapHistory};
use bridge_chain::ChainBridge;
use bridge_storage::SwapStore;
use bridge_types::{
	parse_amount, BuildTxArgs, ResultUpdate, SwapDirection, SwapIntent, SwapStatus,
	TransactionHash,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SwapProcessor {
	direction: SwapDirection,
	store: Arc<dyn SwapStore>,
	bridge: Arc<dyn ChainBridge>,
	history: Arc<SwapHistory>,
	fee: SwapFeeConfig,
	unlock_memo_prefix: String,
}

impl SwapProcessor {
	/// Creates a processor for one direction. The fee applied is the one of the
	/// bridge end `bridge` settles on.
	pub fn new(
		direction: SwapDirection,
		store: Arc<dyn SwapStore>,
		bridge: Arc<dyn ChainBridge>,
		history: Arc<SwapHistory>,
		fees: &FeeSchedule,
		unlock_memo_prefix: impl Into<String>,
	) -> Self {
		let fee = fee_for_endpoint(fees, bridge.is_source_endpoint()).clone();
		Self {
			direction,
			store,
			bridge,
			history,
			fee,
			unlock_memo_prefix: unlock_memo_prefix.into(),
		}
	}

	pub fn direction(&self) -> SwapDirection {
		self.direction
	}

	/// Settles an intent of this processor's direction, returning the hash of
	/// the broadcast settlement transaction.
	pub async fn process(&self, intent: &SwapIntent) -> Result<TransactionHash, SettleError> {
		let id = intent.id.as_str();
		let direction = self.direction;

		let result = self.store.find_result(id, direction).await?;
		if result.is_settled() {
			if intent.status == SwapStatus::NotSettled {
				self.repair_status(id).await;
			}
			return Err(SettleError::AlreadySettled {
				id: id.to_string(),
				tx: result.settlement_tx,
			});
		}

		if let Some(entry) = self.history.lookup(id, direction).await {
			match self.bridge.transaction_exists(&entry.settlement_tx).await {
				Ok(true) => {
					info!(
						"{} swap {} already settled by {} (from history)",
						direction, id, entry.settlement_tx
					);
					self.store
						.update_result(
							id,
							direction,
							ResultUpdate::new(unix_now())
								.with_settlement_tx(entry.settlement_tx.as_str())
								.with_status(SwapStatus::Processed),
						)
						.await?;
					return Err(SettleError::AlreadySettled {
						id: id.to_string(),
						tx: entry.settlement_tx.to_string(),
					});
				}
				Ok(false) => {
					debug!(
						"{} swap {}: remembered transaction {} not on chain, settling again",
						direction, id, entry.settlement_tx
					);
				}
				Err(source) => {
					return Err(SettleError::HistoryCheckFailed {
						id: id.to_string(),
						source,
					});
				}
			}
		}

		let value = parse_amount(&result.value).map_err(|_| SettleError::InvalidValue {
			id: id.to_string(),
			value: result.value.clone(),
		})?;

		let mut args = BuildTxArgs::new(id, direction, result.bind.as_str(), value);
		if direction == SwapDirection::Outbound {
			args = args.with_memo(format!("{}{}", self.unlock_memo_prefix, id));
		}

		let raw = self
			.bridge
			.build_raw_transaction(&args)
			.await
			.map_err(|e| SettleError::BuildFailed {
				id: id.to_string(),
				reason: e.to_string(),
			})?;
		if raw.is_empty() {
			return Err(SettleError::BuildFailed {
				id: id.to_string(),
				reason: "bridge returned an empty transaction".to_string(),
			});
		}

		let signed = self
			.bridge
			.sign_transaction(&raw, &args.extra_args())
			.await
			.map_err(|e| SettleError::SignFailed {
				id: id.to_string(),
				reason: e.to_string(),
			})?;
		if signed.is_empty() {
			return Err(SettleError::SignFailed {
				id: id.to_string(),
				reason: "signer returned an empty transaction or hash".to_string(),
			});
		}
		let hash = signed.hash.clone();

		// Remember and persist the settlement before it can reach the chain
		self.history
			.record(id, direction, value, hash.clone())
			.await;
		self.store
			.update_intent_status(id, direction, SwapStatus::Processed, unix_now(), "")
			.await?;
		let settled_value = calc_swapped_value(value, &self.fee);
		self.store
			.update_result(
				id,
				direction,
				ResultUpdate::new(unix_now())
					.with_settlement_tx(hash.as_str())
					.with_settled_value(settled_value.to_string())
					.with_status(SwapStatus::Processed),
			)
			.await?;

		match self.bridge.send_transaction(&signed).await {
			Ok(sent) => {
				if sent != hash {
					warn!(
						"{} swap {}: chain reported {} for signed transaction {}",
						direction, id, sent, hash
					);
				}
				info!(
					"{} swap {} settled by {} via {}",
					direction,
					id,
					hash,
					self.bridge.name()
				);
				Ok(hash)
			}
			Err(source) => {
				self.mark_failed(id, &source.to_string()).await;
				Err(SettleError::BroadcastFailed {
					id: id.to_string(),
					tx: hash.to_string(),
					source,
				})
			}
		}
	}

	async fn repair_status(&self, id: &str) {
		match self
			.store
			.update_intent_status(id, self.direction, SwapStatus::Processed, unix_now(), "")
			.await
		{
			Ok(()) => info!("{} swap {}: repaired status to processed", self.direction, id),
			Err(e) => warn!(
				"{} swap {}: failed to repair status: {}",
				self.direction, id, e
			),
		}
	}

	async fn mark_failed(&self, id: &str, reason: &str) {
		let now = unix_now();
		if let Err(e) = self
			.store
			.update_intent_status(id, self.direction, SwapStatus::SettleFailed, now, reason)
			.await
		{
			warn!(
				"{} swap {}: failed to mark intent as failed: {}",
				self.direction, id, e
			);
		}
		if let Err(e) = self
			.store
			.update_result(
				id,
				self.direction,
				ResultUpdate::new(now).with_status(SwapStatus::SettleFailed),
			)
			.await
		{
			warn!(
				"{} swap {}: failed to mark result as failed: {}",
				self.direction, id, e
			);
		}
	}
}
