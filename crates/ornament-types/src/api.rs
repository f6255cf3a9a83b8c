//! API types for the ornament order HTTP API.
//!
//! Request bodies, view snapshots returned to the page, and the structured
//! error type with its HTTP status mapping.

use crate::{
	ConsentSpec, FieldSpec, LineId, LineUpdate, OrderRecord, Step, SubmissionStatus,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A design as offered in the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignOption {
	/// Value sent back when selecting the design ("1".."6").
	pub value: String,
	/// Label, e.g. "Design 3 - Christmas Tree".
	pub label: String,
}

/// Pricing tiers as shown to the buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInfo {
	pub unit_price: String,
	pub bundle_size: u64,
	pub bundle_price: String,
	/// Promotion banner, e.g. "Buy 3, Get 1 Free!".
	pub promotion: String,
	pub donation_per_unit: Option<String>,
}

/// Response for GET /api/form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
	pub title: String,
	pub variant: String,
	pub fields: Vec<FieldSpec>,
	pub consents: Vec<ConsentSpec>,
	pub designs: Vec<DesignOption>,
	pub pricing: PricingInfo,
	pub sale_open: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub closed_message: Option<String>,
}

/// A line as rendered on the ornaments and review steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
	pub id: LineId,
	/// 1-based position, shown as "Ornament N".
	pub number: usize,
	pub design: Option<String>,
	pub design_label: String,
	pub engraving: String,
	pub engraving_label: String,
	/// Fixed per-line display price; does not reflect bundle discounts.
	pub unit_price: String,
}

/// Which controls are enabled in the current state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsView {
	pub can_advance: bool,
	pub can_go_back: bool,
	pub can_remove_lines: bool,
	pub can_submit: bool,
}

/// Read-only summary shown on the review step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
	pub buyer: Vec<ReviewField>,
	pub lines: Vec<LineView>,
	pub final_price: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub donation_total: Option<String>,
	pub consents: Vec<ConsentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewField {
	pub label: String,
	pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentView {
	pub key: String,
	pub statement: String,
	pub checked: bool,
}

/// Snapshot of one wizard session, returned by every session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
	pub session_id: String,
	pub step: Step,
	pub total_steps: u8,
	pub description: String,
	pub buyer: Vec<ReviewField>,
	pub lines: Vec<LineView>,
	pub total_price: String,
	pub controls: ControlsView,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub review: Option<ReviewView>,
	pub submission: SubmissionStatus,
	/// Set once the order has been stored; the page shows the confirmation view.
	pub confirmed: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order_id: Option<String>,
	/// Blocking notice after a failed submission.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notice: Option<String>,
}

/// Body for PUT /api/sessions/{id}/buyer/{field}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetBuyerFieldRequest {
	pub value: String,
}

/// Body for PATCH /api/sessions/{id}/lines/{line}.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateLineRequest(pub LineUpdate);

/// Body for PUT /api/sessions/{id}/consents/{flag}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetConsentRequest {
	pub checked: bool,
}

/// Response for GET /api/orders/{id}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderResponse {
	pub id: String,
	pub order: OrderRecord,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	pub details: Option<serde_json::Value>,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter")]
	pub retry_after: Option<u64>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed request (400)
	BadRequest { error_type: String, message: String },
	/// Unknown session or order (404)
	NotFound { error_type: String, message: String },
	/// Request conflicts with the current state, e.g. a submission in flight (409)
	Conflict { error_type: String, message: String },
	/// Request is well-formed but not acceptable in this state (422)
	UnprocessableEntity { error_type: String, message: String },
	/// Dependency unavailable, the caller may retry (503)
	ServiceUnavailable {
		error_type: String,
		message: String,
		retry_after: Option<u64>,
	},
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message, retry_after) = match self {
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::Conflict {
				error_type,
				message,
			}
			| APIError::UnprocessableEntity {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message, None),
			APIError::ServiceUnavailable {
				error_type,
				message,
				retry_after,
			} => (error_type, message, *retry_after),
		};

		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
			details: None,
			retry_after,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			APIError::UnprocessableEntity { message, .. } => {
				write!(f, "Unprocessable Entity: {}", message)
			},
			APIError::ServiceUnavailable { message, .. } => {
				write!(f, "Service Unavailable: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
