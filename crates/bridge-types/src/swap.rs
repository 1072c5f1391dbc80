//! Swap records tracked by the settlement engine.
//!
//! A swap is identified by the source-chain transaction that requested it and
//! the direction it travels in. The intent carries the processing status, the
//! result carries everything needed to settle it and the outcome once settled.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction a swap travels across the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapDirection {
	/// Settled on the destination chain.
	Inbound,
	/// Settled back on the source chain, unlocking the original deposit.
	Outbound,
}

impl SwapDirection {
	pub const ALL: [SwapDirection; 2] = [SwapDirection::Inbound, SwapDirection::Outbound];

	pub fn as_str(&self) -> &'static str {
		match self {
			SwapDirection::Inbound => "inbound",
			SwapDirection::Outbound => "outbound",
		}
	}
}

impl fmt::Display for SwapDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Processing status shared by intents and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
	/// Waiting to be settled.
	NotSettled,
	/// A settlement transaction has been signed and recorded.
	Processed,
	/// Broadcasting the settlement transaction failed. Terminal.
	SettleFailed,
}

impl SwapStatus {
	pub const ALL: [SwapStatus; 3] = [
		SwapStatus::NotSettled,
		SwapStatus::Processed,
		SwapStatus::SettleFailed,
	];
}

impl fmt::Display for SwapStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			SwapStatus::NotSettled => "not_settled",
			SwapStatus::Processed => "processed",
			SwapStatus::SettleFailed => "settle_failed",
		};
		f.write_str(s)
	}
}

/// A pending cross-chain transfer recorded by the upstream detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapIntent {
	/// Source-chain transaction id that requested the swap.
	pub id: String,
	pub direction: SwapDirection,
	pub status: SwapStatus,
	/// Unix timestamp (seconds) when the intent was recorded.
	pub created_at: u64,
	/// Unix timestamp (seconds) of the last status change.
	#[serde(default)]
	pub timestamp: u64,
	/// Free-form note written alongside status changes.
	#[serde(default)]
	pub memo: String,
}

impl SwapIntent {
	/// Creates a fresh, not yet settled intent.
	pub fn new(id: impl Into<String>, direction: SwapDirection, created_at: u64) -> Self {
		Self {
			id: id.into(),
			direction,
			status: SwapStatus::NotSettled,
			created_at,
			timestamp: created_at,
			memo: String::new(),
		}
	}
}

/// Settlement details and outcome attached to an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResult {
	pub id: String,
	pub direction: SwapDirection,
	/// Address the settled value is sent to.
	pub bind: String,
	/// Transfer amount as a decimal or `0x`-prefixed hex string.
	pub value: String,
	/// Hash of the settlement transaction, empty until one is recorded.
	#[serde(default)]
	pub settlement_tx: String,
	/// Amount delivered after swap fees, empty until recorded.
	#[serde(default)]
	pub settled_value: String,
	pub status: SwapStatus,
	#[serde(default)]
	pub timestamp: u64,
}

impl SwapResult {
	pub fn new(
		id: impl Into<String>,
		direction: SwapDirection,
		bind: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			direction,
			bind: bind.into(),
			value: value.into(),
			settlement_tx: String::new(),
			settled_value: String::new(),
			status: SwapStatus::NotSettled,
			timestamp: 0,
		}
	}

	/// A result carrying a settlement hash must never be settled again.
	pub fn is_settled(&self) -> bool {
		!self.settlement_tx.is_empty()
	}

	/// Applies a partial update in place.
	pub fn apply(&mut self, update: ResultUpdate) {
		if let Some(tx) = update.settlement_tx {
			self.settlement_tx = tx;
		}
		if let Some(value) = update.settled_value {
			self.settled_value = value;
		}
		if let Some(status) = update.status {
			self.status = status;
		}
		self.timestamp = update.timestamp;
	}
}

/// Partial update of a stored [`SwapResult`]. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultUpdate {
	pub settlement_tx: Option<String>,
	pub settled_value: Option<String>,
	pub status: Option<SwapStatus>,
	pub timestamp: u64,
}

impl ResultUpdate {
	pub fn new(timestamp: u64) -> Self {
		Self {
			timestamp,
			..Default::default()
		}
	}

	pub fn with_settlement_tx(mut self, tx: impl Into<String>) -> Self {
		self.settlement_tx = Some(tx.into());
		self
	}

	pub fn with_settled_value(mut self, value: impl Into<String>) -> Self {
		self.settled_value = Some(value.into());
		self
	}

	pub fn with_status(mut self, status: SwapStatus) -> Self {
		self.status = Some(status);
		self
	}
}
