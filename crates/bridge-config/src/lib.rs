//! Configuration for the bridge settler.
//!
//! Configuration is read from a TOML, JSON or YAML file. `${VAR}` placeholders
//! are substituted from the environment before parsing, then prefixed
//! environment variables override individual settings and the result is
//! validated.

use thiserror::Error;

mod loader;
pub mod serde_helpers;
mod types;

pub use loader::ConfigLoader;
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}
