//! Configuration types.

use crate::serde_helpers::u256_string;
use bridge_types::{U256, UNLOCK_MEMO_PREFIX};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::Table::new())
}

/// Top-level settler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub settler: SettlerConfig,
	#[serde(default)]
	pub storage: StorageConfig,
	#[serde(default)]
	pub bridges: BridgesConfig,
	#[serde(default)]
	pub fees: FeeSchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlerConfig {
	#[serde(default = "default_name")]
	pub name: String,
	/// Pause between settlement cycles.
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
	/// Intents recorded longer ago than this are no longer picked up.
	#[serde(default = "default_max_settle_lifetime_secs")]
	pub max_settle_lifetime_secs: u64,
	/// Number of recently signed settlements kept in memory. Zero disables it.
	#[serde(default = "default_history_capacity")]
	pub history_capacity: usize,
	#[serde(default = "default_unlock_memo_prefix")]
	pub unlock_memo_prefix: String,
}

fn default_name() -> String {
	"bridge-settler".to_string()
}

fn default_poll_interval_secs() -> u64 {
	3
}

fn default_max_settle_lifetime_secs() -> u64 {
	7 * 24 * 60 * 60
}

fn default_history_capacity() -> usize {
	1000
}

fn default_unlock_memo_prefix() -> String {
	UNLOCK_MEMO_PREFIX.to_string()
}

impl Default for SettlerConfig {
	fn default() -> Self {
		Self {
			name: default_name(),
			poll_interval_secs: default_poll_interval_secs(),
			max_settle_lifetime_secs: default_max_settle_lifetime_secs(),
			history_capacity: default_history_capacity(),
			unlock_memo_prefix: default_unlock_memo_prefix(),
		}
	}
}

impl SettlerConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_secs)
	}

	pub fn max_settle_lifetime(&self) -> Duration {
		Duration::from_secs(self.max_settle_lifetime_secs)
	}
}

/// Storage backend selection. `config` is handed to the backend factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
	pub backend: String,
	#[serde(default = "empty_table")]
	pub config: toml::Value,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: "memory".to_string(),
			config: empty_table(),
		}
	}
}

/// Chain bridge selection. `config` is handed to the bridge factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
	pub implementation: String,
	#[serde(default = "empty_table")]
	pub config: toml::Value,
}

impl BridgeConfig {
	fn local(endpoint: &str) -> Self {
		let mut table = toml::Table::new();
		table.insert(
			"endpoint".to_string(),
			toml::Value::String(endpoint.to_string()),
		);
		Self {
			implementation: "local".to_string(),
			config: toml::Value::Table(table),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgesConfig {
	/// Bridge for the destination chain, settling inbound swaps.
	pub inbound: BridgeConfig,
	/// Bridge for the source chain, settling outbound swaps.
	pub outbound: BridgeConfig,
}

impl Default for BridgesConfig {
	fn default() -> Self {
		Self {
			inbound: BridgeConfig::local("destination"),
			outbound: BridgeConfig::local("source"),
		}
	}
}

/// Swap fee charged by one end of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapFeeConfig {
	/// Fraction of the transfer amount, in `[0, 1)`.
	#[serde(default)]
	pub rate: Decimal,
	#[serde(default, with = "u256_string")]
	pub minimum: U256,
	/// Zero means uncapped.
	#[serde(default, with = "u256_string")]
	pub maximum: U256,
}

impl Default for SwapFeeConfig {
	fn default() -> Self {
		Self {
			rate: Decimal::ZERO,
			minimum: U256::ZERO,
			maximum: U256::ZERO,
		}
	}
}

/// Swap fees for both ends of the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
	#[serde(default)]
	pub source: SwapFeeConfig,
	#[serde(default)]
	pub destination: SwapFeeConfig,
}
