//! In-memory storage backend, lost on restart.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory storage implementation
#[derive(Default)]
pub struct MemoryStorage {
	data: DashMap<String, Vec<u8>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.data
			.get(key)
			.map(|entry| entry.value().clone())
			.ok_or_else(|| StorageError::NotFound(key.to_string()))
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.data.insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		self.data.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.data.contains_key(key))
	}

	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		Ok(self
			.data
			.iter()
			.filter(|entry| entry.key().starts_with(prefix))
			.map(|entry| entry.key().clone())
			.collect())
	}
}

/// Factory function to create a memory storage backend. Takes no configuration.
pub fn create_storage(_config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	Ok(Box::new(MemoryStorage::new()))
}
