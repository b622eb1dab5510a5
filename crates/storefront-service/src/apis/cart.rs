//! Shopping cart endpoints for the signed-in user.

use crate::apis::require_user;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_catalog::{cart_total, CartError, CatalogError};
use storefront_types::{APIError, CartEntry};

/// Response for the cart listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
	/// The user's cart entries.
	pub entries: Vec<CartEntry>,
	/// Sum of price x quantity over the checked entries.
	pub total: Decimal,
}

/// Request body for adding a product to the cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
	/// Product to add.
	pub product_id: String,
	/// Units to add; defaults to one.
	#[serde(default = "default_quantity")]
	pub quantity: u32,
}

fn default_quantity() -> u32 {
	1
}

/// Request body for changing an entry's quantity.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
	/// New quantity; floored to one.
	pub quantity: u32,
}

/// Response for a checked-flag toggle.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
	/// The entry's new checked state.
	pub checked: bool,
}

/// Response for a bulk removal.
#[derive(Debug, Serialize)]
pub struct RemovedResponse {
	/// How many entries were deleted.
	pub removed: usize,
}

/// Handles GET /api/cart requests.
pub async fn list_cart(State(state): State<AppState>) -> Result<Json<CartResponse>, APIError> {
	let user = require_user(&state.engine).await?;
	let entries = state
		.engine
		.cart()
		.entries(&user)
		.await
		.map_err(map_cart_error)?;
	let total = cart_total(&entries);
	Ok(Json(CartResponse { entries, total }))
}

/// Handles POST /api/cart requests.
pub async fn add_to_cart(
	State(state): State<AppState>,
	Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartEntry>, APIError> {
	let user = require_user(&state.engine).await?;
	let product = state
		.engine
		.products()
		.get(&request.product_id)
		.await
		.map_err(|e| match e {
			CatalogError::NotFound(id) => APIError::NotFound {
				error_type: "PRODUCT_NOT_FOUND".to_string(),
				message: format!("Product not found: {}", id),
			},
			other => APIError::InternalServerError {
				message: other.to_string(),
			},
		})?;
	let entry = state
		.engine
		.cart()
		.add(&user, &product, request.quantity)
		.await
		.map_err(map_cart_error)?;
	Ok(Json(entry))
}

/// Handles PATCH /api/cart/{id} requests.
pub async fn set_quantity(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(request): Json<SetQuantityRequest>,
) -> Result<StatusCode, APIError> {
	let user = require_user(&state.engine).await?;
	state
		.engine
		.cart()
		.set_quantity(&user, &id, request.quantity)
		.await
		.map_err(map_cart_error)?;
	Ok(StatusCode::NO_CONTENT)
}

/// Handles POST /api/cart/{id}/toggle requests.
pub async fn toggle_checked(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, APIError> {
	let user = require_user(&state.engine).await?;
	let checked = state
		.engine
		.cart()
		.toggle_checked(&user, &id)
		.await
		.map_err(map_cart_error)?;
	Ok(Json(ToggleResponse { checked }))
}

/// Handles DELETE /api/cart/{id} requests.
pub async fn remove_entry(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, APIError> {
	let user = require_user(&state.engine).await?;
	state
		.engine
		.cart()
		.remove(&user, &id)
		.await
		.map_err(map_cart_error)?;
	Ok(StatusCode::NO_CONTENT)
}

/// Handles DELETE /api/cart/checked requests.
pub async fn remove_checked(
	State(state): State<AppState>,
) -> Result<Json<RemovedResponse>, APIError> {
	let user = require_user(&state.engine).await?;
	let removed = state
		.engine
		.cart()
		.remove_checked(&user)
		.await
		.map_err(map_cart_error)?;
	Ok(Json(RemovedResponse { removed }))
}

fn map_cart_error(e: CartError) -> APIError {
	match e {
		CartError::NotFound(id) => APIError::NotFound {
			error_type: "CART_ENTRY_NOT_FOUND".to_string(),
			message: format!("Cart entry not found: {}", id),
		},
		CartError::Storage(message) => APIError::InternalServerError { message },
	}
}
