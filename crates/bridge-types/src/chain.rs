//! Transaction types exchanged with chain bridges.
//!
//! Bridges are chain-agnostic from the engine's point of view, so raw and
//! signed transactions are opaque byte payloads and hashes keep whatever
//! textual rendering the chain uses.

use crate::SwapDirection;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default memo prefix for outbound settlements, followed by the intent id.
pub const UNLOCK_MEMO_PREFIX: &str = "SWAPTX:";

/// Chain-native rendering of a transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(pub String);

impl TransactionHash {
	pub fn new(hash: impl Into<String>) -> Self {
		Self(hash.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TransactionHash {
	fn from(hash: &str) -> Self {
		Self(hash.to_string())
	}
}

/// Unsigned transaction as produced by a bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction(pub Vec<u8>);

impl RawTransaction {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

/// Signed transaction ready for broadcast, together with its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub payload: Vec<u8>,
	pub hash: TransactionHash,
}

impl SignedTransaction {
	/// True when either the payload or the hash is missing.
	pub fn is_empty(&self) -> bool {
		self.payload.is_empty() || self.hash.is_empty()
	}
}

/// Arguments for building a settlement transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTxArgs {
	/// Id of the intent being settled.
	pub swap_id: String,
	pub direction: SwapDirection,
	/// Receiving address.
	pub to: String,
	pub value: U256,
	/// Only set for outbound swaps, referencing the intent being unlocked.
	pub memo: Option<String>,
}

impl BuildTxArgs {
	pub fn new(
		swap_id: impl Into<String>,
		direction: SwapDirection,
		to: impl Into<String>,
		value: U256,
	) -> Self {
		Self {
			swap_id: swap_id.into(),
			direction,
			to: to.into(),
			value,
			memo: None,
		}
	}

	pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
		self.memo = Some(memo.into());
		self
	}

	/// Extra context forwarded to the signer alongside the raw transaction.
	pub fn extra_args(&self) -> SignExtra {
		SignExtra {
			swap_id: self.swap_id.clone(),
			direction: self.direction,
		}
	}
}

/// Context attached to a signing request so signers can attribute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignExtra {
	pub swap_id: String,
	pub direction: SwapDirection,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_emptiness_checks() {
		assert!(RawTransaction(vec![]).is_empty());
		assert!(!RawTransaction(vec![1]).is_empty());

		let signed = SignedTransaction {
			payload: vec![1, 2],
			hash: TransactionHash::new(""),
		};
		assert!(signed.is_empty());

		let signed = SignedTransaction {
			payload: vec![1, 2],
			hash: "0xabc".into(),
		};
		assert!(!signed.is_empty());
	}

	#[test]
	fn test_extra_args() {
		let args = BuildTxArgs::new("tx1", SwapDirection::Outbound, "addrB", U256::from(5u64))
			.with_memo(format!("{}tx1", UNLOCK_MEMO_PREFIX));
		assert_eq!(args.memo.as_deref(), Some("SWAPTX:tx1"));

		let extra = args.extra_args();
		assert_eq!(extra.swap_id, "tx1");
		assert_eq!(extra.direction, SwapDirection::Outbound);
	}
}
