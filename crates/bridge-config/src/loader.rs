//! Configuration loading from files and environment.

use crate::{Config, ConfigError, SwapFeeConfig};
use bridge_types::U256;
use regex::Regex;
use rust_decimal::Decimal;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
enum Format {
	Toml,
	Json,
	Yaml,
}

impl Format {
	fn from_path(path: &Path) -> Result<Self, ConfigError> {
		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Ok(Format::Toml),
			Some("json") => Ok(Format::Json),
			Some("yaml") | Some("yml") => Ok(Format::Yaml),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {:?}",
				path
			))),
		}
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "BRIDGE_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads, overrides and validates the configuration.
	///
	/// Without a file the defaults are used as the base.
	pub async fn load(&self) -> Result<Config, ConfigError> {
		let mut config = match &self.file_path {
			Some(path) => self.load_from_file(path).await?,
			None => {
				debug!("No configuration file given, using defaults");
				Config::default()
			}
		};

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;
		Ok(config)
	}

	async fn load_from_file(&self, path: &Path) -> Result<Config, ConfigError> {
		info!("Loading configuration from {:?}", path);

		if !tokio::fs::try_exists(path).await? {
			return Err(ConfigError::FileNotFound(path.display().to_string()));
		}
		let format = Format::from_path(path)?;
		let contents = tokio::fs::read_to_string(path).await?;

		parse(&substitute_env_vars(&contents)?, format)
	}

	/// Parses a TOML document after substituting `${VAR}` placeholders.
	/// Environment overrides are applied, then the result is validated.
	pub fn load_from_toml(&self, contents: &str) -> Result<Config, ConfigError> {
		let mut config = parse(&substitute_env_vars(contents)?, Format::Toml)?;
		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;
		Ok(config)
	}

	fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
		if let Some(value) = self.env_override("POLL_INTERVAL_SECS") {
			config.settler.poll_interval_secs = parse_number(&value, "poll interval")?;
		}

		if let Some(value) = self.env_override("MAX_SETTLE_LIFETIME_SECS") {
			config.settler.max_settle_lifetime_secs = parse_number(&value, "max settle lifetime")?;
		}

		if let Some(value) = self.env_override("HISTORY_CAPACITY") {
			config.settler.history_capacity = parse_number(&value, "history capacity")?;
		}

		if let Some(value) = self.env_override("STORAGE_BACKEND") {
			config.storage.backend = value;
		}

		Ok(())
	}

	fn env_override(&self, key: &str) -> Option<String> {
		let name = format!("{}{}", self.env_prefix, key);
		let value = env::var(&name).ok()?;
		debug!("Overriding {} from environment", name);
		Some(value)
	}
}

fn parse(contents: &str, format: Format) -> Result<Config, ConfigError> {
	match format {
		Format::Toml => toml::from_str(contents)
			.map_err(|e| ConfigError::ParseError(format!("Failed to parse TOML: {}", e))),
		Format::Json => serde_json::from_str(contents)
			.map_err(|e| ConfigError::ParseError(format!("Failed to parse JSON: {}", e))),
		Format::Yaml => serde_yaml::from_str(contents)
			.map_err(|e| ConfigError::ParseError(format!("Failed to parse YAML: {}", e))),
	}
}

fn parse_number<T: FromStr>(value: &str, what: &str) -> Result<T, ConfigError>
where
	T::Err: std::fmt::Display,
{
	value
		.trim()
		.parse()
		.map_err(|e| ConfigError::ValidationError(format!("Invalid {}: {}", what, e)))
}

/// Replaces every `${VAR_NAME}` with the value of the environment variable.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let mut result = content.to_string();

	let re = Regex::new(r"\$\{([^}]+)\}")
		.map_err(|e| ConfigError::ParseError(format!("Invalid placeholder pattern: {}", e)))?;

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Validate configuration
pub(crate) fn validate_config(config: &Config) -> Result<(), ConfigError> {
	if config.settler.poll_interval_secs == 0 {
		return Err(ConfigError::ValidationError(
			"poll_interval_secs must be greater than zero".to_string(),
		));
	}

	if config.settler.max_settle_lifetime_secs == 0 {
		return Err(ConfigError::ValidationError(
			"max_settle_lifetime_secs must be greater than zero".to_string(),
		));
	}

	if config.storage.backend.trim().is_empty() {
		return Err(ConfigError::ValidationError(
			"storage backend must be set".to_string(),
		));
	}

	for (direction, bridge) in [
		("inbound", &config.bridges.inbound),
		("outbound", &config.bridges.outbound),
	] {
		if bridge.implementation.trim().is_empty() {
			return Err(ConfigError::ValidationError(format!(
				"{} bridge implementation must be set",
				direction
			)));
		}
	}

	validate_fee("source", &config.fees.source)?;
	validate_fee("destination", &config.fees.destination)?;

	Ok(())
}

fn validate_fee(endpoint: &str, fee: &SwapFeeConfig) -> Result<(), ConfigError> {
	if fee.rate < Decimal::ZERO || fee.rate >= Decimal::ONE {
		return Err(ConfigError::ValidationError(format!(
			"{} fee rate {} must be in [0, 1)",
			endpoint, fee.rate
		)));
	}

	if fee.maximum != U256::ZERO && fee.minimum > fee.maximum {
		return Err(ConfigError::ValidationError(format!(
			"{} fee minimum {} exceeds maximum {}",
			endpoint, fee.minimum, fee.maximum
		)));
	}

	Ok(())
}
