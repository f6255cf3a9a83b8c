//! Storage module for the ornament order system.
//!
//! This module provides abstractions for persisting submitted orders,
//! supporting different backend implementations such as in-memory or
//! file-based document storage.

use async_trait::async_trait;
use ornament_types::ImplementationRegistry;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when creating a key that is already taken.
	#[error("Already exists: {0}")]
	AlreadyExists(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Keys have the form `<collection>:<id>`. Values are opaque bytes; the
/// typed layer above serializes them as JSON. Documents are append-only:
/// a key, once written, is never replaced or removed.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes only if the key is not yet taken.
	///
	/// Returns [`StorageError::AlreadyExists`] when it is.
	async fn insert_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and stores values as
/// JSON documents under `<namespace>:<id>`.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a serializable value under a fresh id.
	///
	/// Never replaces an existing document.
	pub async fn insert<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.insert_bytes(&Self::key(namespace, id), bytes)
			.await
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
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Doc {
		name: String,
		count: u32,
	}

	#[tokio::test]
	async fn test_typed_insert_and_retrieve() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		let doc = Doc {
			name: "star".into(),
			count: 3,
		};

		service.insert("orders", "a", &doc).await.unwrap();
		let back: Doc = service.retrieve("orders", "a").await.unwrap();
		assert_eq!(back, doc);

		let missing: Result<Doc, _> = service.retrieve("orders", "b").await;
		assert!(matches!(missing, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_insert_does_not_overwrite() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		let first = Doc {
			name: "first".into(),
			count: 1,
		};
		let second = Doc {
			name: "second".into(),
			count: 2,
		};

		service.insert("orders", "x", &first).await.unwrap();
		let result = service.insert("orders", "x", &second).await;
		assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

		let back: Doc = service.retrieve("orders", "x").await.unwrap();
		assert_eq!(back, first);
	}

	#[tokio::test]
	async fn test_retrieve_wrong_shape_is_serialization_error() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		service.insert("orders", "y", &"just a string").await.unwrap();

		let result: Result<Doc, _> = service.retrieve("orders", "y").await;
		assert!(matches!(result, Err(StorageError::Serialization(_))));
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert!(names.contains(&"file"));
		assert!(names.contains(&"memory"));
	}
}
