//! Favorites endpoints for the signed-in user.

use crate::apis::require_user;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::response::Json;
use storefront_types::APIError;

/// Handles GET /api/favorites requests.
pub async fn list_favorites(
	State(state): State<AppState>,
) -> Result<Json<Vec<String>>, APIError> {
	let user = require_user(&state.engine).await?;
	let favorites = state
		.engine
		.favorites()
		.list(&user.id)
		.await
		.map_err(|e| APIError::InternalServerError {
			message: e.to_string(),
		})?;
	Ok(Json(favorites))
}

/// Handles POST /api/favorites/{product_id}/toggle requests.
pub async fn toggle_favorite(
	State(state): State<AppState>,
	Path(product_id): Path<String>,
) -> Result<Json<Vec<String>>, APIError> {
	let user = require_user(&state.engine).await?;
	let favorites = state
		.engine
		.favorites()
		.toggle(&user.id, &product_id)
		.await
		.map_err(|e| APIError::InternalServerError {
			message: e.to_string(),
		})?;
	Ok(Json(favorites))
}
