//! Settlement engine wiring both directions together.

use crate::{CoreError, SettlementLoop, SwapHistory, SwapProcessor};
use bridge_chain::{ChainBridge, ChainError};
use bridge_config::Config;
use bridge_storage::{KvSwapStore, StorageError, StorageInterface, StorageService, SwapStore};
use bridge_types::SwapDirection;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

// Type aliases for factory functions
type StorageFactory =
	Box<dyn Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> + Send + Sync>;
type BridgeFactory =
	Box<dyn Fn(&toml::Value) -> Result<Box<dyn ChainBridge>, ChainError> + Send + Sync>;

/// Runs the inbound and outbound settlement loops over a shared store and
/// history.
pub struct SettlementEngine {
	config: Config,
	store: Arc<dyn SwapStore>,
	history: Arc<SwapHistory>,
	inbound: Arc<SettlementLoop>,
	outbound: Arc<SettlementLoop>,
}

impl SettlementEngine {
	/// Creates an engine settling inbound swaps through `inbound_bridge` and
	/// outbound swaps through `outbound_bridge`.
	pub fn new(
		config: Config,
		store: Arc<dyn SwapStore>,
		inbound_bridge: Arc<dyn ChainBridge>,
		outbound_bridge: Arc<dyn ChainBridge>,
	) -> Self {
		let history = Arc::new(SwapHistory::new(config.settler.history_capacity));

		let settlement_loop = |direction, bridge| {
			let processor = SwapProcessor::new(
				direction,
				store.clone(),
				bridge,
				history.clone(),
				&config.fees,
				config.settler.unlock_memo_prefix.clone(),
			);
			Arc::new(SettlementLoop::new(
				store.clone(),
				processor,
				config.settler.poll_interval(),
				config.settler.max_settle_lifetime(),
			))
		};

		let inbound = settlement_loop(SwapDirection::Inbound, inbound_bridge);
		let outbound = settlement_loop(SwapDirection::Outbound, outbound_bridge);

		Self {
			config,
			store,
			history,
			inbound,
			outbound,
		}
	}

	/// Runs both settlement loops on their own tasks. Only returns once either
	/// loop task ends, which always means it died. The other loop is aborted.
	pub async fn run(&self) -> Result<(), CoreError> {
		info!("Starting settlement engine {}", self.config.settler.name);

		let inbound = self.inbound.clone();
		let outbound = self.outbound.clone();
		let mut inbound = tokio::spawn(async move { inbound.run().await });
		let mut outbound = tokio::spawn(async move { outbound.run().await });

		let (direction, joined) = tokio::select! {
			joined = &mut inbound => {
				outbound.abort();
				(SwapDirection::Inbound, joined)
			}
			joined = &mut outbound => {
				inbound.abort();
				(SwapDirection::Outbound, joined)
			}
		};

		let reason = match joined {
			Ok(()) => format!("{} loop stopped", direction),
			Err(e) => format!("{} loop: {}", direction, e),
		};
		error!("Settlement engine halted: {}", reason);
		Err(CoreError::Task(reason))
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn store(&self) -> &Arc<dyn SwapStore> {
		&self.store
	}

	pub fn history(&self) -> &Arc<SwapHistory> {
		&self.history
	}

	pub fn worker(&self, direction: SwapDirection) -> &Arc<SettlementLoop> {
		match direction {
			SwapDirection::Inbound => &self.inbound,
			SwapDirection::Outbound => &self.outbound,
		}
	}
}

// Factory pattern for creating the engine from config
pub struct SettlementEngineBuilder {
	config: Config,
	storage_factories: HashMap<String, StorageFactory>,
	bridge_factories: HashMap<String, BridgeFactory>,
}

impl SettlementEngineBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			storage_factories: HashMap::new(),
			bridge_factories: HashMap::new(),
		}
	}

	pub fn with_storage_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>
			+ Send
			+ Sync
			+ 'static,
	{
		self.storage_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	pub fn with_bridge_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Box<dyn ChainBridge>, ChainError> + Send + Sync + 'static,
	{
		self.bridge_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	/// Opens the configured storage backend as a swap store.
	pub fn build_store(&self) -> Result<Arc<KvSwapStore>, CoreError> {
		let backend = &self.config.storage.backend;
		let factory = self.storage_factories.get(backend).ok_or_else(|| {
			CoreError::Config(format!("Unknown storage backend '{}'", backend))
		})?;

		let storage = factory(&self.config.storage.config)?;
		Ok(Arc::new(KvSwapStore::new(StorageService::new(storage))))
	}

	fn build_bridge(&self, direction: SwapDirection) -> Result<Arc<dyn ChainBridge>, CoreError> {
		let bridge_config = match direction {
			SwapDirection::Inbound => &self.config.bridges.inbound,
			SwapDirection::Outbound => &self.config.bridges.outbound,
		};

		let factory = self
			.bridge_factories
			.get(&bridge_config.implementation)
			.ok_or_else(|| {
				CoreError::Config(format!(
					"Unknown {} bridge implementation '{}'",
					direction, bridge_config.implementation
				))
			})?;

		let bridge = factory(&bridge_config.config)?;
		info!("Using bridge {} for {} swaps", bridge.name(), direction);
		Ok(Arc::from(bridge))
	}

	pub fn build(self) -> Result<SettlementEngine, CoreError> {
		let store = self.build_store()?;
		let inbound = self.build_bridge(SwapDirection::Inbound)?;
		let outbound = self.build_bridge(SwapDirection::Outbound)?;

		Ok(SettlementEngine::new(self.config, store, inbound, outbound))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::processor::tests::MockBridge;
	use bridge_chain::implementations::local;
	use bridge_storage::implementations::memory;
	use bridge_types::{SwapIntent, SwapResult, SwapStatus};
	use std::time::Duration;

	fn builder(config: Config) -> SettlementEngineBuilder {
		SettlementEngineBuilder::new(config)
			.with_storage_factory("memory", memory::create_storage)
			.with_bridge_factory("local", local::create_bridge)
	}

	#[test]
	fn test_build_with_defaults() {
		let engine = builder(Config::default()).build().unwrap();

		assert_eq!(engine.history().capacity(), 1000);
		assert_eq!(
			engine.worker(SwapDirection::Inbound).direction(),
			SwapDirection::Inbound
		);
		assert_eq!(
			engine.worker(SwapDirection::Outbound).direction(),
			SwapDirection::Outbound
		);
		assert!(!engine.worker(SwapDirection::Inbound).is_running());
	}

	#[test]
	fn test_unknown_names_are_config_errors() {
		let mut config = Config::default();
		config.storage.backend = "redis".to_string();
		assert!(matches!(
			builder(config).build(),
			Err(CoreError::Config(msg)) if msg.contains("redis")
		));

		let mut config = Config::default();
		config.bridges.outbound.implementation = "carrier-pigeon".to_string();
		assert!(matches!(
			builder(config).build(),
			Err(CoreError::Config(msg)) if msg.contains("carrier-pigeon")
		));
	}

	#[test]
	fn test_factory_errors_propagate() {
		let mut config = Config::default();
		config.bridges.inbound.config = toml::Value::Table(toml::Table::new());
		assert!(matches!(
			builder(config).build(),
			Err(CoreError::Chain(ChainError::Config(_)))
		));
	}

	#[tokio::test]
	async fn test_run_settles_both_directions() {
		let mut config = Config::default();
		config.settler.poll_interval_secs = 1;

		let store = Arc::new(KvSwapStore::new(StorageService::new(Box::new(
			memory::MemoryStorage::new(),
		))));
		let now = crate::unix_now();
		for direction in SwapDirection::ALL {
			store
				.register_swap(
					&SwapIntent::new("tx1", direction, now),
					&SwapResult::new("tx1", direction, "addrA", "100"),
				)
				.await
				.unwrap();
		}

		let inbound = Arc::new(MockBridge::new());
		let outbound = Arc::new(MockBridge {
			source: true,
			..MockBridge::new()
		});
		let engine = SettlementEngine::new(config, store.clone(), inbound.clone(), outbound.clone());

		// run() never returns on its own
		assert!(tokio::time::timeout(Duration::from_millis(300), engine.run())
			.await
			.is_err());

		assert_eq!(inbound.sends(), 1);
		assert_eq!(outbound.sends(), 1);
		assert!(engine.worker(SwapDirection::Inbound).is_running());
		assert_eq!(engine.history().len().await, 2);

		for direction in SwapDirection::ALL {
			let result = store.find_result("tx1", direction).await.unwrap();
			assert_eq!(result.status, SwapStatus::Processed);
		}

		let outbound_args = outbound.last_args.lock().unwrap().clone().unwrap();
		assert_eq!(outbound_args.memo.as_deref(), Some("SWAPTX:tx1"));
	}

	#[tokio::test]
	async fn test_run_reports_dead_loop() {
		let store = Arc::new(KvSwapStore::new(StorageService::new(Box::new(
			memory::MemoryStorage::new(),
		))));
		store
			.register_swap(
				&SwapIntent::new("tx1", SwapDirection::Inbound, crate::unix_now()),
				&SwapResult::new("tx1", SwapDirection::Inbound, "addrA", "100"),
			)
			.await
			.unwrap();

		let inbound = Arc::new(MockBridge::new());
		inbound
			.panic_build
			.store(true, std::sync::atomic::Ordering::SeqCst);
		let outbound = Arc::new(MockBridge {
			source: true,
			..MockBridge::new()
		});
		let engine = SettlementEngine::new(Config::default(), store, inbound, outbound);

		let result = tokio::time::timeout(Duration::from_secs(2), engine.run())
			.await
			.expect("a dead loop must end run()");
		assert!(matches!(
			result,
			Err(CoreError::Task(reason)) if reason.starts_with("inbound loop")
		));
	}
}
