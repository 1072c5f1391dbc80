//! File-based storage backend.
//!
//! Every key is stored in its own file under a base directory. File names are
//! the hex encoding of the key so that keys survive a listing round trip.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

const FILE_EXTENSION: &str = "json";

/// File-based storage implementation.
///
/// This implementation stores data as files on the filesystem,
/// providing simple persistence without requiring external dependencies.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	fn get_file_path(&self, key: &str) -> PathBuf {
		self.base_path
			.join(format!("{}.{}", hex::encode(key), FILE_EXTENSION))
	}

	fn key_from_file_name(name: &str) -> Option<String> {
		let stem = name.strip_suffix(&format!(".{}", FILE_EXTENSION))?;
		let bytes = hex::decode(stem).ok()?;
		String::from_utf8(bytes).ok()
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				Err(StorageError::NotFound(key.to_string()))
			}
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut keys = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let file_name = entry.file_name();
			let Some(key) = file_name.to_str().and_then(Self::key_from_file_name) else {
				continue;
			};
			if key.starts_with(prefix) {
				keys.push(key);
			}
		}
		Ok(keys)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/swaps")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/swaps");

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_file_storage_round_trip_and_listing() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().join("swaps"));

		// Listing a directory that does not exist yet is empty
		assert!(storage.keys("intent:").await.unwrap().is_empty());

		storage
			.set_bytes("intent:inbound:tx/1", b"one".to_vec())
			.await
			.unwrap();
		storage
			.set_bytes("intent:outbound:tx2", b"two".to_vec())
			.await
			.unwrap();
		storage
			.set_bytes("result:inbound:tx/1", b"three".to_vec())
			.await
			.unwrap();

		assert_eq!(
			storage.get_bytes("intent:inbound:tx/1").await.unwrap(),
			b"one".to_vec()
		);
		assert!(storage.exists("intent:outbound:tx2").await.unwrap());
		assert!(!storage.exists("intent:outbound:tx3").await.unwrap());

		let mut keys = storage.keys("intent:").await.unwrap();
		keys.sort();
		assert_eq!(keys, vec!["intent:inbound:tx/1", "intent:outbound:tx2"]);

		assert!(matches!(
			storage.get_bytes("missing").await,
			Err(StorageError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_overwrite_replaces_value() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("k", b"a".to_vec()).await.unwrap();
		storage.set_bytes("k", b"b".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes("k").await.unwrap(), b"b".to_vec());
		assert_eq!(storage.keys("").await.unwrap(), vec!["k".to_string()]);

		storage.delete("k").await.unwrap();
		assert!(storage.keys("").await.unwrap().is_empty());
		// Deleting again is fine
		storage.delete("k").await.unwrap();
	}

	#[test]
	fn test_create_storage_reads_path() {
		let config: toml::Value = toml::from_str("storage_path = \"/tmp/bridge-test\"").unwrap();
		assert!(create_storage(&config).is_ok());
	}
}
