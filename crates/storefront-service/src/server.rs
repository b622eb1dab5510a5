//! HTTP server for the storefront API.
//!
//! This module provides the HTTP surface the operator dashboard and the
//! storefront clients use: the order dashboard with its filter, search
//! and sort parameters, status transitions, checkout, the product
//! catalog, the cart and favorites.

use axum::{
	routing::{delete, get, patch, post},
	Router,
};
use std::sync::Arc;
use storefront_config::ApiConfig;
use storefront_core::StorefrontEngine;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::apis;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the storefront engine for processing requests.
	pub engine: Arc<StorefrontEngine>,
}

/// Starts the HTTP server for the API.
///
/// This function creates and configures the HTTP server with routing,
/// middleware, and error handling for all endpoints.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<StorefrontEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState { engine };

	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				// Operator dashboard
				.route("/orders", get(apis::orders::list_orders))
				.route("/orders/refresh", post(apis::orders::refresh_orders))
				.route("/orders/{id}", get(apis::orders::get_order))
				.route("/orders/{id}/advance", post(apis::orders::advance_order))
				.route("/orders/{id}/revert", post(apis::orders::revert_order))
				// Storefront
				.route("/my/orders", get(apis::orders::my_orders))
				.route("/checkout", post(apis::orders::checkout))
				.route(
					"/products",
					get(apis::products::list_products).post(apis::products::create_product),
				)
				.route(
					"/products/{id}",
					get(apis::products::get_product)
						.patch(apis::products::update_product)
						.delete(apis::products::delete_product),
				)
				.route(
					"/cart",
					get(apis::cart::list_cart).post(apis::cart::add_to_cart),
				)
				.route("/cart/checked", delete(apis::cart::remove_checked))
				.route(
					"/cart/{id}",
					patch(apis::cart::set_quantity).delete(apis::cart::remove_entry),
				)
				.route("/cart/{id}/toggle", post(apis::cart::toggle_checked))
				.route("/favorites", get(apis::favorites::list_favorites))
				.route(
					"/favorites/{product_id}/toggle",
					post(apis::favorites::toggle_favorite),
				),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Storefront API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
