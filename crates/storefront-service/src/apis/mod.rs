//! API endpoint implementations for the storefront service.

pub mod cart;
pub mod favorites;
pub mod orders;
pub mod products;

use storefront_core::StorefrontEngine;
use storefront_types::{APIError, AuthUser};

/// Resolves the signed-in user or maps the failure to an API error.
pub(crate) async fn require_user(engine: &StorefrontEngine) -> Result<AuthUser, APIError> {
	match engine.auth().current_user().await {
		Ok(Some(user)) => Ok(user),
		Ok(None) => Err(APIError::Forbidden {
			message: "No user is signed in".to_string(),
		}),
		Err(e) => Err(APIError::InternalServerError {
			message: e.to_string(),
		}),
	}
}

/// Resolves the signed-in user and requires the operator role.
pub(crate) async fn require_operator(engine: &StorefrontEngine) -> Result<AuthUser, APIError> {
	let user = require_user(engine).await?;
	if user.is_operator() {
		Ok(user)
	} else {
		Err(APIError::Forbidden {
			message: "This surface requires the operator role".to_string(),
		})
	}
}
