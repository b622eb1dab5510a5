//! Product catalog endpoints.
//!
//! Browsing is public; every mutation requires the operator role.

use crate::apis::require_operator;
use crate::server::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use storefront_catalog::{CatalogError, CatalogView, NewProduct, ProductUpdate};
use storefront_types::{APIError, Category, Product};

/// Query parameters for catalog browsing.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
	/// Case-insensitive name search.
	pub q: Option<String>,
	/// Category name to restrict to.
	pub category: Option<String>,
}

/// Handles GET /api/products requests.
pub async fn list_products(
	State(state): State<AppState>,
	Query(params): Query<BrowseParams>,
) -> Result<Json<Vec<Product>>, APIError> {
	let category = match params.category.as_deref() {
		None => None,
		Some(raw) => Some(raw.parse::<Category>().map_err(|e| APIError::BadRequest {
			error_type: "INVALID_CATEGORY".to_string(),
			message: e.to_string(),
			details: None,
		})?),
	};
	let products = state
		.engine
		.products()
		.list()
		.await
		.map_err(map_catalog_error)?;
	let view = CatalogView {
		search: params.q,
		category,
	};
	Ok(Json(view.apply(&products)))
}

/// Handles GET /api/products/{id} requests.
pub async fn get_product(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Product>, APIError> {
	let product = state
		.engine
		.products()
		.get(&id)
		.await
		.map_err(map_catalog_error)?;
	Ok(Json(product))
}

/// Handles POST /api/products requests.
pub async fn create_product(
	State(state): State<AppState>,
	Json(submission): Json<NewProduct>,
) -> Result<Json<Product>, APIError> {
	require_operator(&state.engine).await?;
	let product = state
		.engine
		.add_product(submission)
		.await
		.map_err(map_catalog_error)?;
	Ok(Json(product))
}

/// Handles PATCH /api/products/{id} requests.
pub async fn update_product(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(update): Json<ProductUpdate>,
) -> Result<StatusCode, APIError> {
	require_operator(&state.engine).await?;
	state
		.engine
		.update_product(&id, update)
		.await
		.map_err(map_catalog_error)?;
	Ok(StatusCode::NO_CONTENT)
}

/// Handles DELETE /api/products/{id} requests.
pub async fn delete_product(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, APIError> {
	require_operator(&state.engine).await?;
	state
		.engine
		.delete_product(&id)
		.await
		.map_err(map_catalog_error)?;
	Ok(StatusCode::NO_CONTENT)
}

fn map_catalog_error(e: CatalogError) -> APIError {
	match e {
		CatalogError::Invalid(errors) => APIError::BadRequest {
			error_type: "INVALID_PRODUCT".to_string(),
			message: "Product submission failed validation".to_string(),
			details: serde_json::to_value(&errors).ok(),
		},
		CatalogError::NotFound(id) => APIError::NotFound {
			error_type: "PRODUCT_NOT_FOUND".to_string(),
			message: format!("Product not found: {}", id),
		},
		CatalogError::EmptyUpdate => APIError::BadRequest {
			error_type: "EMPTY_UPDATE".to_string(),
			message: "Update has no fields".to_string(),
			details: None,
		},
		CatalogError::Storage(e) => APIError::InternalServerError {
			message: e.to_string(),
		},
	}
}
