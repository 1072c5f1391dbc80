//! Storage module for the bridge settler.
//!
//! This module provides abstractions for persistent storage of swap records.
//! A low-level key-value [`StorageInterface`] is implemented by interchangeable
//! backends, [`StorageService`] adds typed JSON access on top of it, and
//! [`SwapStore`] is the swap-level interface consumed by the settlement engine.

use async_trait::async_trait;
use bridge_types::{ResultUpdate, SwapDirection, SwapIntent, SwapResult, SwapStatus};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

mod swaps;

pub use swaps::KvSwapStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found: {0}")]
	NotFound(String),
	/// Error that occurs when inserting an item that is already present.
	#[error("Already exists: {0}")]
	AlreadyExists(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// This trait must be implemented by any storage backend that wants to
/// integrate with the settler. It provides basic key-value operations
/// plus prefix listing, which the swap store uses to scan a direction.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key. Missing keys are not
	/// an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists every key starting with `prefix`, in no particular order.
	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed data with
/// automatic serialization/deserialization.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a serializable value.
	///
	/// The namespace and id are combined to form a unique key.
	/// The data is serialized to JSON before storage.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Removes a value from storage.
	///
	/// The namespace and id are combined to form the key to delete.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	/// Checks whether a value is stored under the namespace and id.
	pub async fn contains(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	/// Retrieves every value stored in a namespace.
	///
	/// Keys that disappear between listing and reading are skipped.
	pub async fn list<T: DeserializeOwned>(&self, namespace: &str) -> Result<Vec<T>, StorageError> {
		let prefix = format!("{}:", namespace);
		let keys = self.backend.keys(&prefix).await?;

		let mut values = Vec::with_capacity(keys.len());
		for key in keys {
			let bytes = match self.backend.get_bytes(&key).await {
				Ok(bytes) => bytes,
				Err(StorageError::NotFound(_)) => continue,
				Err(e) => return Err(e),
			};
			let value = serde_json::from_slice(&bytes)
				.map_err(|e| StorageError::Serialization(format!("{}: {}", key, e)))?;
			values.push(value);
		}
		Ok(values)
	}
}

/// Swap-level persistence consumed by the settlement engine.
///
/// Implementations are expected to be safe for concurrent use from both
/// settlement directions.
#[async_trait]
pub trait SwapStore: Send + Sync {
	/// Returns intents with `status` created at or after `since`, oldest first.
	async fn find_pending(
		&self,
		direction: SwapDirection,
		status: SwapStatus,
		since: u64,
	) -> Result<Vec<SwapIntent>, StorageError>;

	/// Loads the result attached to an intent.
	async fn find_result(
		&self,
		id: &str,
		direction: SwapDirection,
	) -> Result<SwapResult, StorageError>;

	/// Sets the durable status of an intent.
	async fn update_intent_status(
		&self,
		id: &str,
		direction: SwapDirection,
		status: SwapStatus,
		timestamp: u64,
		memo: &str,
	) -> Result<(), StorageError>;

	/// Applies a partial update to the result attached to an intent.
	async fn update_result(
		&self,
		id: &str,
		direction: SwapDirection,
		update: ResultUpdate,
	) -> Result<(), StorageError>;
}
