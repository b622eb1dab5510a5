//! API types for HTTP endpoints and request/response structures.

use crate::{Order, OrderStatus, StatusCounts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Standard error response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code.
	pub error: String,
	/// Human-readable description.
	pub message: String,
	/// Additional error context.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Bad request with validation errors (400).
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Requested entity does not exist (404).
	NotFound { error_type: String, message: String },
	/// Caller is not allowed to use this surface (403).
	Forbidden { message: String },
	/// Business rule rejected the request (422).
	UnprocessableEntity { error_type: String, message: String },
	/// Internal server error (500).
	InternalServerError { message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> StatusCode {
		match self {
			APIError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			APIError::NotFound { .. } => StatusCode::NOT_FOUND,
			APIError::Forbidden { .. } => StatusCode::FORBIDDEN,
			APIError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
			APIError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::NotFound {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
			APIError::Forbidden { message } => ErrorResponse {
				error: "FORBIDDEN".to_string(),
				message: message.clone(),
				details: None,
			},
			APIError::UnprocessableEntity {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
			APIError::InternalServerError { message } => ErrorResponse {
				error: "INTERNAL_ERROR".to_string(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl IntoResponse for APIError {
	fn into_response(self) -> Response {
		(self.status_code(), Json(self.to_error_response())).into_response()
	}
}

/// Response for the order dashboard listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
	/// Orders after filter, search and sort were applied.
	pub orders: Vec<Order>,
	/// Number of orders in `orders`.
	pub shown: usize,
	/// Per-status counts over the unfiltered list.
	pub counts: StatusCounts,
	/// Whether the store is still waiting for its first snapshot.
	pub loading: bool,
	/// Last store-level error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

/// Response for a status transition request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
	/// Order the transition was requested for.
	pub order_id: String,
	/// Whether a transition was applied; false means the order was already
	/// at the end of the flow in the requested direction.
	pub applied: bool,
	/// Status after the request.
	pub status: OrderStatus,
	/// Timestamp recorded in the history entry, when one was appended.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub changed_at: Option<DateTime<Utc>>,
}

/// Request body for checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
	/// Shipping recipient.
	pub full_name: String,
	/// Contact phone number.
	pub phone: String,
	/// Delivery address.
	pub address: String,
}

/// Response for a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
	/// Id of the created order.
	pub order_id: String,
	/// Display-only order number.
	pub order_number: u32,
	/// Order total at checkout time.
	pub total: Decimal,
}
