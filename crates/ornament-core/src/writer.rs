//! Order persistence.
//!
//! [`OrderWriter`] appends one immutable record to the `orders` collection and
//! returns the identifier it was stored under. [`OrderStore`] is the
//! implementation backed by [`StorageService`].

use async_trait::async_trait;
use chrono::Utc;
use ornament_storage::{StorageError, StorageService};
use ornament_types::{truncate_id, OrderRecord, StorageKey};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors from writing or reading orders.
#[derive(Debug, Error)]
pub enum WriteError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Order not found: {0}")]
	NotFound(String),
}

/// Appends submitted orders to the document store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderWriter: Send + Sync {
	/// Writes the record and returns its generated identifier.
	async fn append(&self, record: &OrderRecord) -> Result<String, WriteError>;
}

/// Order collection stored through a [`StorageService`].
pub struct OrderStore {
	storage: Arc<StorageService>,
}

impl OrderStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Reads a stored order by id.
	pub async fn get_order(&self, order_id: &str) -> Result<OrderRecord, WriteError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => WriteError::NotFound(order_id.to_string()),
				other => WriteError::Storage(other.to_string()),
			})
	}
}

#[async_trait]
impl OrderWriter for OrderStore {
	async fn append(&self, record: &OrderRecord) -> Result<String, WriteError> {
		let order_id = Uuid::new_v4().to_string();

		let mut stored = record.clone();
		stored.order_date = Some(Utc::now());

		self.storage
			.insert(StorageKey::Orders.as_str(), &order_id, &stored)
			.await
			.map_err(|e| WriteError::Storage(e.to_string()))?;

		tracing::info!(
			order_id = %truncate_id(&order_id),
			ornaments = stored.total_ornaments,
			total = %stored.total_price,
			"Order stored"
		);
		Ok(order_id)
	}
}
