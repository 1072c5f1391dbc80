//! In-process chain bridge.
//!
//! Raw transactions are the JSON encoding of the build arguments, signing is a
//! keccak-256 digest and broadcasting records the payload in memory. Suitable
//! for development setups where no chain or signing gateway is available.

use crate::{endpoint_from_config, BridgeEndpoint, ChainBridge, ChainError};
use async_trait::async_trait;
use bridge_types::{BuildTxArgs, RawTransaction, SignExtra, SignedTransaction, TransactionHash};
use dashmap::DashMap;
use sha3::{Digest, Keccak256};
use tracing::debug;

pub struct LocalBridge {
	name: String,
	endpoint: BridgeEndpoint,
	/// Broadcast transactions keyed by hash.
	sent: DashMap<TransactionHash, Vec<u8>>,
}

impl LocalBridge {
	pub fn new(endpoint: BridgeEndpoint) -> Self {
		Self {
			name: format!("local-{}", endpoint),
			endpoint,
			sent: DashMap::new(),
		}
	}

	/// Number of transactions broadcast so far.
	pub fn sent_count(&self) -> usize {
		self.sent.len()
	}
}

#[async_trait]
impl ChainBridge for LocalBridge {
	fn name(&self) -> &str {
		&self.name
	}

	fn is_source_endpoint(&self) -> bool {
		self.endpoint == BridgeEndpoint::Source
	}

	async fn build_raw_transaction(
		&self,
		args: &BuildTxArgs,
	) -> Result<RawTransaction, ChainError> {
		let payload = serde_json::json!({
			"swapId": args.swap_id,
			"direction": args.direction,
			"to": args.to,
			"value": args.value.to_string(),
			"memo": args.memo,
		});
		serde_json::to_vec(&payload)
			.map(RawTransaction)
			.map_err(|e| ChainError::Build(e.to_string()))
	}

	async fn sign_transaction(
		&self,
		raw: &RawTransaction,
		extra: &SignExtra,
	) -> Result<SignedTransaction, ChainError> {
		let mut hasher = Keccak256::new();
		hasher.update(raw.as_bytes());
		hasher.update(extra.swap_id.as_bytes());
		hasher.update(extra.direction.as_str().as_bytes());
		let digest = hasher.finalize();

		let hash = TransactionHash(format!("0x{}", hex::encode(digest)));
		debug!("{} signed transaction {} for {}", self.name, hash, extra.swap_id);

		Ok(SignedTransaction {
			payload: raw.0.clone(),
			hash,
		})
	}

	async fn send_transaction(
		&self,
		signed: &SignedTransaction,
	) -> Result<TransactionHash, ChainError> {
		self.sent
			.insert(signed.hash.clone(), signed.payload.clone());
		Ok(signed.hash.clone())
	}

	async fn transaction_exists(&self, hash: &TransactionHash) -> Result<bool, ChainError> {
		Ok(self.sent.contains_key(hash))
	}
}

/// Factory function to create a local bridge from configuration.
///
/// Configuration parameters:
/// - `endpoint`: "source" or "destination"
pub fn create_bridge(config: &toml::Value) -> Result<Box<dyn ChainBridge>, ChainError> {
	Ok(Box::new(LocalBridge::new(endpoint_from_config(config)?)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_types::{SwapDirection, U256};

	#[tokio::test]
	async fn test_local_bridge_lifecycle() {
		let bridge = LocalBridge::new(BridgeEndpoint::Destination);
		assert!(!bridge.is_source_endpoint());

		let args = BuildTxArgs::new("tx1", SwapDirection::Inbound, "addrA", U256::from(100u64));
		let raw = bridge.build_raw_transaction(&args).await.unwrap();
		assert!(!raw.is_empty());

		let signed = bridge
			.sign_transaction(&raw, &args.extra_args())
			.await
			.unwrap();
		assert!(signed.hash.as_str().starts_with("0x"));
		assert_eq!(signed.hash.as_str().len(), 66);

		assert!(!bridge.transaction_exists(&signed.hash).await.unwrap());
		let sent = bridge.send_transaction(&signed).await.unwrap();
		assert_eq!(sent, signed.hash);
		assert!(bridge.transaction_exists(&signed.hash).await.unwrap());
		assert_eq!(bridge.sent_count(), 1);
	}

	#[tokio::test]
	async fn test_signing_is_deterministic_per_swap() {
		let bridge = LocalBridge::new(BridgeEndpoint::Source);
		let args = BuildTxArgs::new("tx1", SwapDirection::Outbound, "addrB", U256::from(1u64))
			.with_memo("SWAPTX:tx1");
		let raw = bridge.build_raw_transaction(&args).await.unwrap();

		let a = bridge.sign_transaction(&raw, &args.extra_args()).await.unwrap();
		let b = bridge.sign_transaction(&raw, &args.extra_args()).await.unwrap();
		assert_eq!(a.hash, b.hash);

		let other = BuildTxArgs::new("tx2", SwapDirection::Outbound, "addrB", U256::from(1u64));
		let c = bridge
			.sign_transaction(&raw, &other.extra_args())
			.await
			.unwrap();
		assert_ne!(a.hash, c.hash);
	}

	#[test]
	fn test_create_bridge_requires_endpoint() {
		let config: toml::Value = toml::from_str("endpoint = \"source\"").unwrap();
		let bridge = create_bridge(&config).unwrap();
		assert!(bridge.is_source_endpoint());
		assert_eq!(bridge.name(), "local-source");

		let empty = toml::Value::Table(Default::default());
		assert!(create_bridge(&empty).is_err());
	}
}
