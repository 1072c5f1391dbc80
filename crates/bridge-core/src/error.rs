use bridge_chain::ChainError;
use bridge_storage::StorageError;
use thiserror::Error;

/// Outcome of a failed settlement attempt for a single intent.
#[derive(Debug, Error)]
pub enum SettleError {
	/// The intent already has a settlement transaction. Not a fault.
	#[error("swap {id} already settled by {tx}")]
	AlreadySettled { id: String, tx: String },

	#[error("swap {id} has invalid value {value:?}")]
	InvalidValue { id: String, value: String },

	/// The chain could not confirm whether a remembered settlement exists.
	#[error("history check for swap {id} failed: {source}")]
	HistoryCheckFailed { id: String, source: ChainError },

	#[error("building settlement for swap {id} failed: {reason}")]
	BuildFailed { id: String, reason: String },

	#[error("signing settlement for swap {id} failed: {reason}")]
	SignFailed { id: String, reason: String },

	/// The settlement was recorded but never reached the chain. Terminal.
	#[error("broadcast of {tx} for swap {id} failed: {source}")]
	BroadcastFailed {
		id: String,
		tx: String,
		source: ChainError,
	},

	#[error("Storage error: {0}")]
	Store(#[from] StorageError),
}

impl SettleError {
	pub fn is_already_settled(&self) -> bool {
		matches!(self, SettleError::AlreadySettled { .. })
	}
}

#[derive(Debug, Error)]
pub enum CoreError {
	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),

	#[error("Chain error: {0}")]
	Chain(#[from] ChainError),

	#[error("Task error: {0}")]
	Task(String),
}
