//! JSON-RPC chain bridge.
//!
//! Transaction building, broadcast and lookups go to a chain gateway, signing
//! goes to a separate threshold signing gateway. Both speak JSON-RPC 2.0 over
//! HTTP. Building and lookups are idempotent and retried on transport errors;
//! signing and broadcasting are never retried here.

use crate::{endpoint_from_config, BridgeEndpoint, ChainBridge, ChainError};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use bridge_types::{BuildTxArgs, RawTransaction, SignExtra, SignedTransaction, TransactionHash};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_SECS: u64 = 10;

/// Connection settings for an [`RpcBridge`].
#[derive(Debug, Clone)]
pub struct RpcBridgeConfig {
	pub name: String,
	pub endpoint: BridgeEndpoint,
	/// Chain gateway used to build, send and look up transactions.
	pub rpc_url: String,
	/// Threshold signing gateway.
	pub signer_url: String,
	/// Per-request timeout.
	pub timeout: Duration,
	/// Upper bound on time spent retrying idempotent calls.
	pub max_retry_elapsed: Duration,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
	#[serde(default)]
	result: Option<Value>,
	#[serde(default)]
	error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
	code: i64,
	message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
	signed_tx: String,
	tx_hash: String,
}

/// Chain bridge backed by JSON-RPC gateways.
pub struct RpcBridge {
	config: RpcBridgeConfig,
	client: reqwest::Client,
	next_id: AtomicU64,
}

impl RpcBridge {
	pub fn new(config: RpcBridgeConfig) -> Result<Self, ChainError> {
		let client = reqwest::Client::builder()
			.timeout(config.timeout)
			.build()
			.map_err(|e| ChainError::Config(format!("failed to build HTTP client: {}", e)))?;

		Ok(Self {
			config,
			client,
			next_id: AtomicU64::new(1),
		})
	}

	/// Performs a single JSON-RPC call and returns its `result` member.
	async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value, ChainError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let request = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params,
		});

		debug!("{} -> {} (id {})", self.config.name, method, id);

		let response = self
			.client
			.post(url)
			.json(&request)
			.send()
			.await
			.map_err(|e| ChainError::Transport(format!("{}: {}", method, e)))?;

		if !response.status().is_success() {
			return Err(ChainError::Transport(format!(
				"{}: HTTP {}",
				method,
				response.status()
			)));
		}

		let body: RpcResponse = response
			.json()
			.await
			.map_err(|e| ChainError::Transport(format!("{}: invalid response: {}", method, e)))?;

		if let Some(error) = body.error {
			return Err(ChainError::Rpc {
				code: error.code,
				message: error.message,
			});
		}

		Ok(body.result.unwrap_or(Value::Null))
	}

	/// Retries a call on transport errors with exponential backoff.
	async fn call_idempotent(
		&self,
		url: &str,
		method: &str,
		params: Value,
	) -> Result<Value, ChainError> {
		let policy = ExponentialBackoff {
			max_elapsed_time: Some(self.config.max_retry_elapsed),
			..Default::default()
		};

		backoff::future::retry(policy, || {
			let params = params.clone();
			async move {
				self.call(url, method, params).await.map_err(|e| match e {
					ChainError::Transport(_) => {
						warn!("{} {} failed, retrying: {}", self.config.name, method, e);
						backoff::Error::transient(e)
					}
					other => backoff::Error::permanent(other),
				})
			}
		})
		.await
	}
}

fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
	hex::decode(value.strip_prefix("0x").unwrap_or(value))
}

#[async_trait]
impl ChainBridge for RpcBridge {
	fn name(&self) -> &str {
		&self.config.name
	}

	fn is_source_endpoint(&self) -> bool {
		self.config.endpoint == BridgeEndpoint::Source
	}

	async fn build_raw_transaction(
		&self,
		args: &BuildTxArgs,
	) -> Result<RawTransaction, ChainError> {
		let params = json!([{
			"swapId": args.swap_id,
			"direction": args.direction,
			"to": args.to,
			"value": args.value.to_string(),
			"memo": args.memo,
		}]);

		let result = self
			.call_idempotent(&self.config.rpc_url, "bridge_buildRawTransaction", params)
			.await
			.map_err(|e| ChainError::Build(e.to_string()))?;

		match result {
			Value::Null => Ok(RawTransaction(Vec::new())),
			Value::String(raw) => decode_hex(&raw)
				.map(RawTransaction)
				.map_err(|e| ChainError::Build(format!("invalid raw transaction hex: {}", e))),
			other => Err(ChainError::Build(format!(
				"unexpected raw transaction {}",
				other
			))),
		}
	}

	async fn sign_transaction(
		&self,
		raw: &RawTransaction,
		extra: &SignExtra,
	) -> Result<SignedTransaction, ChainError> {
		let params = json!([
			format!("0x{}", hex::encode(raw.as_bytes())),
			{ "swapId": extra.swap_id, "direction": extra.direction },
		]);

		let result = self
			.call(&self.config.signer_url, "bridge_signTransaction", params)
			.await
			.map_err(|e| ChainError::Signing(e.to_string()))?;

		if result.is_null() {
			return Ok(SignedTransaction {
				payload: Vec::new(),
				hash: TransactionHash::new(""),
			});
		}

		let response: SignResponse = serde_json::from_value(result)
			.map_err(|e| ChainError::Signing(format!("invalid sign response: {}", e)))?;
		let payload = decode_hex(&response.signed_tx)
			.map_err(|e| ChainError::Signing(format!("invalid signed transaction hex: {}", e)))?;

		Ok(SignedTransaction {
			payload,
			hash: TransactionHash(response.tx_hash),
		})
	}

	async fn send_transaction(
		&self,
		signed: &SignedTransaction,
	) -> Result<TransactionHash, ChainError> {
		let params = json!([format!("0x{}", hex::encode(&signed.payload))]);

		let result = self
			.call(&self.config.rpc_url, "bridge_sendRawTransaction", params)
			.await
			.map_err(|e| ChainError::Send(e.to_string()))?;

		let hash = result
			.as_str()
			.map(TransactionHash::from)
			.ok_or_else(|| ChainError::Send(format!("unexpected send result {}", result)))?;

		if hash != signed.hash {
			warn!(
				"{} reported hash {} for signed transaction {}",
				self.config.name, hash, signed.hash
			);
		}
		info!("{} broadcast transaction {}", self.config.name, hash);
		Ok(hash)
	}

	async fn transaction_exists(&self, hash: &TransactionHash) -> Result<bool, ChainError> {
		let result = self
			.call_idempotent(
				&self.config.rpc_url,
				"bridge_getTransaction",
				json!([hash.as_str()]),
			)
			.await
			.map_err(|e| ChainError::Query(e.to_string()))?;

		Ok(!result.is_null())
	}
}

/// Factory function to create an RPC bridge from configuration.
///
/// Configuration parameters:
/// - `endpoint`: "source" or "destination"
/// - `rpc_url`: chain gateway URL
/// - `signer_url`: threshold signing gateway URL
/// - `name`: optional name for logs (default: "rpc-<endpoint>")
/// - `timeout_secs`: optional request timeout (default: 30)
/// - `max_retry_secs`: optional retry budget for idempotent calls (default: 10)
pub fn create_bridge(config: &toml::Value) -> Result<Box<dyn ChainBridge>, ChainError> {
	let endpoint = endpoint_from_config(config)?;

	let required = |key: &str| {
		config
			.get(key)
			.and_then(|v| v.as_str())
			.map(str::to_string)
			.ok_or_else(|| ChainError::Config(format!("{} is required for rpc bridge", key)))
	};
	let seconds = |key: &str, default: u64| {
		config
			.get(key)
			.and_then(|v| v.as_integer())
			.map(|v| v.max(0) as u64)
			.unwrap_or(default)
	};

	let name = config
		.get("name")
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.unwrap_or_else(|| format!("rpc-{}", endpoint));

	let bridge = RpcBridge::new(RpcBridgeConfig {
		name,
		endpoint,
		rpc_url: required("rpc_url")?,
		signer_url: required("signer_url")?,
		timeout: Duration::from_secs(seconds("timeout_secs", DEFAULT_TIMEOUT_SECS)),
		max_retry_elapsed: Duration::from_secs(seconds("max_retry_secs", DEFAULT_RETRY_SECS)),
	})?;

	Ok(Box::new(bridge))
}
