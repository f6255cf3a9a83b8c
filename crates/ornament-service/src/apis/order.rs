//! Order retrieval endpoint.
//!
//! Lets organizers look up a stored order by the identifier returned when it
//! was submitted.

use ornament_core::{OrderEngine, WriteError};
use ornament_types::{APIError, GetOrderResponse};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors that can occur during order retrieval.
#[derive(Debug, Error)]
pub enum GetOrderError {
	#[error("Order not found: {0}")]
	NotFound(String),
	#[error("Invalid order ID format: {0}")]
	InvalidId(String),
	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<GetOrderError> for APIError {
	fn from(err: GetOrderError) -> Self {
		let message = err.to_string();
		match err {
			GetOrderError::NotFound(_) => APIError::NotFound {
				error_type: "ORDER_NOT_FOUND".to_string(),
				message,
			},
			GetOrderError::InvalidId(_) => APIError::BadRequest {
				error_type: "INVALID_ORDER_ID".to_string(),
				message,
			},
			GetOrderError::Internal(_) => APIError::InternalServerError {
				error_type: "INTERNAL_ERROR".to_string(),
				message,
			},
		}
	}
}

/// Handles GET /api/orders/{id} requests.
pub async fn get_order_by_id(
	engine: &OrderEngine,
	order_id: &str,
) -> Result<GetOrderResponse, GetOrderError> {
	info!("Retrieving order with ID: {}", order_id);
	validate_order_id(order_id)?;

	let order = engine
		.orders()
		.get_order(order_id)
		.await
		.map_err(|e| match e {
			WriteError::NotFound(id) => GetOrderError::NotFound(id),
			other => {
				warn!("Order retrieval failed: {}", other);
				GetOrderError::Internal(other.to_string())
			},
		})?;

	Ok(GetOrderResponse {
		id: order_id.to_string(),
		order,
	})
}

/// Order ids are UUIDs assigned by the store.
fn validate_order_id(order_id: &str) -> Result<(), GetOrderError> {
	if Uuid::parse_str(order_id).is_err() {
		return Err(GetOrderError::InvalidId(format!(
			"Order ID must be a valid UUID: {}",
			order_id
		)));
	}
	Ok(())
}
