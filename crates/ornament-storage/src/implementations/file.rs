//! File-based storage backend.
//!
//! Each document is a JSON file at `<storage_path>/<collection>/<id>.json`.
//! Writes go to a temporary file that is renamed into place, so readers never
//! observe a partial document. Create-only inserts take an advisory lock on
//! `<storage_path>/.lock` so two processes sharing the directory cannot both
//! claim the same id.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use fs2::FileExt;
use ornament_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tokio::fs;

const LOCK_FILE: &str = ".lock";
const DEFAULT_STORAGE_PATH: &str = "./data/orders";

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a filesystem-safe file path.
	///
	/// `orders:5f0c..` maps to `<base>/orders/5f0c...json`; characters outside
	/// `[A-Za-z0-9_-]` are replaced with `_`.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let (collection, id) = key.split_once(':').unwrap_or(("default", key));
		self.base_path
			.join(sanitize(collection))
			.join(format!("{}.json", sanitize(id)))
	}
}

fn sanitize(segment: &str) -> String {
	let cleaned: String = segment
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
				c
			} else {
				'_'
			}
		})
		.collect();
	if cleaned.is_empty() {
		"_".to_string()
	} else {
		cleaned
	}
}

fn backend_err(e: std::io::Error) -> StorageError {
	StorageError::Backend(e.to_string())
}

/// Writes `value` to `path` via a temporary sibling file.
///
/// The temporary file is removed again if the write or the rename fails.
fn write_atomic(path: &Path, value: &[u8]) -> Result<(), StorageError> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(backend_err)?;
	}
	let temp_path = path.with_extension("tmp");
	let written = std::fs::write(&temp_path, value).and_then(|_| std::fs::rename(&temp_path, path));
	if let Err(e) = written {
		if let Err(cleanup) = std::fs::remove_file(&temp_path) {
			if cleanup.kind() != std::io::ErrorKind::NotFound {
				tracing::warn!("Failed to remove {}: {}", temp_path.display(), cleanup);
			}
		}
		return Err(backend_err(e));
	}
	Ok(())
}

/// Create-only write under the directory lock.
fn insert_locked(base_path: &Path, path: &Path, key: &str, value: &[u8]) -> Result<(), StorageError> {
	std::fs::create_dir_all(base_path).map_err(backend_err)?;
	let lock = OpenOptions::new()
		.create(true)
		.truncate(false)
		.write(true)
		.open(base_path.join(LOCK_FILE))
		.map_err(backend_err)?;
	FileExt::lock_exclusive(&lock).map_err(backend_err)?;

	let result = if path.exists() {
		Err(StorageError::AlreadyExists(key.to_string()))
	} else {
		write_atomic(path, value)
	};

	if let Err(e) = FileExt::unlock(&lock) {
		tracing::warn!("Failed to release storage lock: {}", e);
	}
	result
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);
		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(backend_err(e)),
		}
	}

	async fn insert_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let base_path = self.base_path.clone();
		let key = key.to_string();
		tokio::task::spawn_blocking(move || insert_locked(&base_path, &path, &key, &value))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(s) if !s.trim().is_empty() => Ok(()),
						_ => Err("storage_path cannot be empty".to_string()),
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for order documents (default: "./data/orders")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_document_lands_on_disk() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		storage
			.insert_bytes("orders:abc-123", b"{}".to_vec())
			.await
			.unwrap();

		assert!(temp_dir.path().join("orders").join("abc-123.json").exists());
		assert_eq!(storage.get_bytes("orders:abc-123").await.unwrap(), b"{}");
		assert!(matches!(
			storage.get_bytes("orders:missing").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_insert_is_create_only() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		storage.insert_bytes("orders:1", b"first".to_vec()).await.unwrap();
		let result = storage.insert_bytes("orders:1", b"second".to_vec()).await;

		assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
		assert_eq!(storage.get_bytes("orders:1").await.unwrap(), b"first");
		assert!(!temp_dir.path().join("orders").join("1.tmp").exists());
	}

	#[test]
	fn test_failed_rename_removes_temp_file() {
		let temp_dir = TempDir::new().unwrap();
		let target = temp_dir.path().join("orders").join("1.json");
		// A non-empty directory in the way makes the rename fail.
		std::fs::create_dir_all(target.join("occupied")).unwrap();

		let result = write_atomic(&target, b"{}");

		assert!(matches!(result, Err(StorageError::Backend(_))));
		assert!(!temp_dir.path().join("orders").join("1.tmp").exists());
		assert!(target.is_dir());
	}

	#[test]
	fn test_keys_are_sanitized() {
		let storage = FileStorage::new(PathBuf::from("/base"));
		assert_eq!(
			storage.get_file_path("orders:../../etc/passwd"),
			PathBuf::from("/base/orders/______etc_passwd.json")
		);
	}

	#[test]
	fn test_factory_validates_config() {
		let bad: toml::Value = toml::from_str("storage_path = \"\"").unwrap();
		assert!(create_storage(&bad).is_err());

		let typo: toml::Value = toml::from_str("storage_dir = \"./x\"").unwrap();
		assert!(create_storage(&typo).is_err());

		let good: toml::Value = toml::from_str("storage_path = \"./x\"").unwrap();
		assert!(create_storage(&good).is_ok());
	}
}
