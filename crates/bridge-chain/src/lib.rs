//! Chain bridge capability for the bridge settler.
//!
//! A chain bridge knows how to build, sign (through a threshold signing
//! service), broadcast and look up transactions for one chain. The settlement
//! engine only ever talks to chains through the [`ChainBridge`] trait.
//!
//! Available implementations:
//! - `rpc`: JSON-RPC gateway for transaction building and broadcast, plus a
//!   separate threshold signing gateway
//! - `local`: in-process bridge for development and tests

use async_trait::async_trait;
use bridge_types::{BuildTxArgs, RawTransaction, SignExtra, SignedTransaction, TransactionHash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod implementations {
	pub mod local;
	pub mod rpc;
}

/// Errors that can occur while interacting with a chain.
#[derive(Debug, Error)]
pub enum ChainError {
	#[error("Build failed: {0}")]
	Build(String),
	#[error("Signing failed: {0}")]
	Signing(String),
	#[error("Send failed: {0}")]
	Send(String),
	#[error("Query failed: {0}")]
	Query(String),
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },
	#[error("Transport error: {0}")]
	Transport(String),
	#[error("Invalid bridge configuration: {0}")]
	Config(String),
}

/// Which end of the bridge a chain bridge settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeEndpoint {
	Source,
	Destination,
}

impl fmt::Display for BridgeEndpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BridgeEndpoint::Source => f.write_str("source"),
			BridgeEndpoint::Destination => f.write_str("destination"),
		}
	}
}

impl FromStr for BridgeEndpoint {
	type Err = ChainError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"source" => Ok(BridgeEndpoint::Source),
			"destination" => Ok(BridgeEndpoint::Destination),
			other => Err(ChainError::Config(format!(
				"unknown endpoint {:?}, expected \"source\" or \"destination\"",
				other
			))),
		}
	}
}

/// Reads the mandatory `endpoint` key of a bridge configuration table.
pub fn endpoint_from_config(config: &toml::Value) -> Result<BridgeEndpoint, ChainError> {
	config
		.get("endpoint")
		.and_then(|v| v.as_str())
		.ok_or_else(|| ChainError::Config("endpoint is required".to_string()))?
		.parse()
}

/// Capability to settle transactions on one chain.
#[async_trait]
pub trait ChainBridge: Send + Sync {
	/// Human-readable name used in logs.
	fn name(&self) -> &str;

	/// Whether this bridge settles on the source end of the bridge.
	fn is_source_endpoint(&self) -> bool;

	/// Builds an unsigned settlement transaction.
	async fn build_raw_transaction(&self, args: &BuildTxArgs)
		-> Result<RawTransaction, ChainError>;

	/// Obtains a threshold signature over a raw transaction.
	async fn sign_transaction(
		&self,
		raw: &RawTransaction,
		extra: &SignExtra,
	) -> Result<SignedTransaction, ChainError>;

	/// Broadcasts a signed transaction, returning the hash the chain reports.
	async fn send_transaction(
		&self,
		signed: &SignedTransaction,
	) -> Result<TransactionHash, ChainError>;

	/// Checks whether a transaction is known to the chain.
	async fn transaction_exists(&self, hash: &TransactionHash) -> Result<bool, ChainError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_endpoint_from_config() {
		let config: toml::Value = toml::from_str("endpoint = \"source\"").unwrap();
		assert_eq!(endpoint_from_config(&config).unwrap(), BridgeEndpoint::Source);

		let config: toml::Value = toml::from_str("endpoint = \"sideways\"").unwrap();
		assert!(matches!(
			endpoint_from_config(&config),
			Err(ChainError::Config(_))
		));

		let config: toml::Value = toml::from_str("name = \"x\"").unwrap();
		assert!(endpoint_from_config(&config).is_err());
	}
}
