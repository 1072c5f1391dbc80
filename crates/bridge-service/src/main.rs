use anyhow::{Context, Result};
use bridge_chain::implementations::{local, rpc};
use bridge_config::{Config, ConfigLoader};
use bridge_core::SettlementEngineBuilder;
use bridge_storage::implementations::{file, memory};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod status;

#[derive(Parser)]
#[command(name = "bridge-settler")]
#[command(about = "Cross-chain bridge swap settlement service", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(
		short,
		long,
		value_name = "FILE",
		env = "BRIDGE_CONFIG",
		default_value = "config/settler.toml"
	)]
	config: PathBuf,

	#[arg(long, env = "BRIDGE_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Start settling swaps
	Start,
	/// Validate the configuration file
	Validate,
	/// Show settlement progress recorded in the store
	Status,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match cli.command {
		Some(Commands::Start) | None => start_service(cli).await,
		Some(Commands::Validate) => validate_config(cli).await,
		Some(Commands::Status) => show_status(cli).await,
	}
}

async fn load_config(cli: &Cli) -> Result<Config> {
	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")
}

/// Registers every storage backend and bridge implementation shipped with
/// the service.
fn engine_builder(config: Config) -> SettlementEngineBuilder {
	SettlementEngineBuilder::new(config)
		.with_storage_factory("memory", memory::create_storage)
		.with_storage_factory("file", file::create_storage)
		.with_bridge_factory("local", local::create_bridge)
		.with_bridge_factory("rpc", rpc::create_bridge)
}

async fn start_service(cli: Cli) -> Result<()> {
	info!("Starting bridge settler");

	let config = load_config(&cli).await?;
	info!("Settler name: {}", config.settler.name);
	info!("Storage backend: {}", config.storage.backend);

	let engine = engine_builder(config)
		.build()
		.context("Failed to build settlement engine")?;

	tokio::select! {
		result = engine.run() => {
			result.context("Settlement engine stopped")?;
		}
		_ = setup_shutdown_signal() => {
			info!("Shutdown signal received, stopping");
		}
	}

	info!("Bridge settler stopped");
	Ok(())
}

async fn validate_config(cli: Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = load_config(&cli).await?;

	info!("Configuration is valid");
	info!("Settler name: {}", config.settler.name);
	info!(
		"Poll interval: {}s, settle lifetime: {}s, history capacity: {}",
		config.settler.poll_interval_secs,
		config.settler.max_settle_lifetime_secs,
		config.settler.history_capacity
	);
	info!("Storage backend: {}", config.storage.backend);
	info!("Inbound bridge: {}", config.bridges.inbound.implementation);
	info!("Outbound bridge: {}", config.bridges.outbound.implementation);
	info!(
		"Fee rates: source {}, destination {}",
		config.fees.source.rate, config.fees.destination.rate
	);

	Ok(())
}

async fn show_status(cli: Cli) -> Result<()> {
	let config = load_config(&cli).await?;
	let lifetime = config.settler.max_settle_lifetime_secs;

	let store = engine_builder(config)
		.build_store()
		.context("Failed to open swap store")?;

	let since = (chrono::Utc::now().timestamp().max(0) as u64).saturating_sub(lifetime);
	let report = status::collect(store.as_ref(), since)
		.await
		.context("Failed to read swap status")?;

	print!("{}", status::render(&report));
	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
		.with_context(|| format!("Invalid log level: {}", log_level))?;

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn setup_shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			error!("Failed to listen for Ctrl+C: {}", e);
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut sigterm) => {
				sigterm.recv().await;
			}
			Err(e) => {
				error!("Failed to install SIGTERM handler: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
