//! Order dashboard and checkout endpoints.
//!
//! The dashboard endpoints read derived views over the order store and
//! drive status transitions through the engine; nothing here talks to the
//! document store directly. Checkout places an order for the signed-in
//! user.

use crate::apis::{require_operator, require_user};
use crate::server::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use storefront_core::{EngineError, PlaceOrderError, StorefrontEngine};
use storefront_orders::{status_counts, CheckoutError, OrderView, ShippingDetails, StatusFilter, TransitionOutcome};
use storefront_types::{
	APIError, CheckoutRequest, CheckoutResponse, Order, OrderListResponse, OrderStatus,
	SortDirection, TransitionResponse,
};

/// Query parameters of the dashboard listing.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
	/// Status name, or `All` (the default).
	pub status: Option<String>,
	/// Free-text search over id, full name and status.
	pub q: Option<String>,
	/// `asc` or `desc` (the default).
	pub sort: Option<String>,
}

fn parse_view(params: &OrderListParams) -> Result<OrderView, APIError> {
	let filter = match params.status.as_deref() {
		None => StatusFilter::All,
		Some(s) if s.eq_ignore_ascii_case("all") => StatusFilter::All,
		Some(s) => StatusFilter::Only(s.parse::<OrderStatus>().map_err(|e| {
			APIError::BadRequest {
				error_type: "INVALID_STATUS".to_string(),
				message: e.to_string(),
				details: None,
			}
		})?),
	};
	let sort = match params.sort.as_deref() {
		None | Some("desc") => SortDirection::Descending,
		Some("asc") => SortDirection::Ascending,
		Some(other) => {
			return Err(APIError::BadRequest {
				error_type: "INVALID_SORT".to_string(),
				message: format!("Unknown sort direction: {}", other),
				details: None,
			})
		}
	};
	Ok(OrderView {
		filter,
		search: params.q.clone(),
		sort,
	})
}

fn list_response(engine: &StorefrontEngine, view: &OrderView) -> OrderListResponse {
	let store = engine.orders();
	let snapshot = store.snapshot();
	let orders = view.apply(&snapshot);
	OrderListResponse {
		shown: orders.len(),
		orders,
		counts: status_counts(&snapshot),
		loading: store.is_loading(),
		error: store.error(),
	}
}

/// Handles GET /api/orders requests.
///
/// Returns the derived dashboard view: filtered, searched and sorted
/// orders plus the per-status counts over the unfiltered list.
pub async fn list_orders(
	State(state): State<AppState>,
	Query(params): Query<OrderListParams>,
) -> Result<Json<OrderListResponse>, APIError> {
	require_operator(&state.engine).await?;
	let view = parse_view(&params)?;
	Ok(Json(list_response(&state.engine, &view)))
}

/// Handles POST /api/orders/refresh requests.
///
/// One-shot fallback fetch for when the live feed is down; errors land in
/// the store state that the response carries back.
pub async fn refresh_orders(
	State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, APIError> {
	require_operator(&state.engine).await?;
	state.engine.coordinator().refresh().await;
	Ok(Json(list_response(&state.engine, &OrderView::default())))
}

/// Handles GET /api/orders/{id} requests.
pub async fn get_order(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Order>, APIError> {
	let user = require_user(&state.engine).await?;
	let order = state
		.engine
		.orders()
		.snapshot()
		.iter()
		.find(|order| order.id == id)
		.cloned()
		.ok_or_else(|| order_not_found(&id))?;
	if !user.is_operator() && order.user_id != user.id {
		// Customers cannot see other customers' orders.
		return Err(order_not_found(&id));
	}
	Ok(Json(order))
}

/// Handles GET /api/my/orders requests.
///
/// The signed-in customer's own orders, newest first.
pub async fn my_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, APIError> {
	let user = require_user(&state.engine).await?;
	let orders: Vec<Order> = state
		.engine
		.orders()
		.snapshot()
		.iter()
		.filter(|order| order.user_id == user.id)
		.cloned()
		.collect();
	Ok(Json(orders))
}

/// Handles POST /api/orders/{id}/advance requests.
pub async fn advance_order(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<TransitionResponse>, APIError> {
	require_operator(&state.engine).await?;
	let outcome = state
		.engine
		.advance_order(&id)
		.await
		.map_err(map_engine_error)?;
	Ok(Json(transition_response(&state.engine, id, outcome)))
}

/// Handles POST /api/orders/{id}/revert requests.
pub async fn revert_order(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<TransitionResponse>, APIError> {
	require_operator(&state.engine).await?;
	let outcome = state
		.engine
		.revert_order(&id)
		.await
		.map_err(map_engine_error)?;
	Ok(Json(transition_response(&state.engine, id, outcome)))
}

fn transition_response(
	engine: &StorefrontEngine,
	order_id: String,
	outcome: TransitionOutcome,
) -> TransitionResponse {
	match outcome {
		TransitionOutcome::Applied { status, changed_at } => TransitionResponse {
			order_id,
			applied: true,
			status,
			changed_at: Some(changed_at),
		},
		TransitionOutcome::NoOp => {
			// Report the unchanged current status back.
			let status = engine
				.orders()
				.snapshot()
				.iter()
				.find(|order| order.id == order_id)
				.map(|order| order.status)
				.unwrap_or_default();
			TransitionResponse {
				order_id,
				applied: false,
				status,
				changed_at: None,
			}
		}
	}
}

/// Handles POST /api/checkout requests.
pub async fn checkout(
	State(state): State<AppState>,
	Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, APIError> {
	let details = ShippingDetails {
		full_name: request.full_name,
		phone: request.phone,
		address: request.address,
	};
	match state.engine.place_order(&details).await {
		Ok(order) => Ok(Json(CheckoutResponse {
			order_id: order.id,
			order_number: order.order_number.unwrap_or_default(),
			total: order.total,
		})),
		Err(e) => {
			tracing::warn!("Checkout failed: {}", e);
			Err(map_checkout_error(e))
		}
	}
}

fn order_not_found(id: &str) -> APIError {
	APIError::NotFound {
		error_type: "ORDER_NOT_FOUND".to_string(),
		message: format!("Order not found: {}", id),
	}
}

fn map_engine_error(e: EngineError) -> APIError {
	match e {
		EngineError::OrderNotFound(id) => order_not_found(&id),
		other => APIError::InternalServerError {
			message: other.to_string(),
		},
	}
}

fn map_checkout_error(e: PlaceOrderError) -> APIError {
	match e {
		PlaceOrderError::Auth(e) => APIError::Forbidden {
			message: e.to_string(),
		},
		PlaceOrderError::Checkout(CheckoutError::Invalid(errors)) => APIError::BadRequest {
			error_type: "INVALID_SHIPPING_DETAILS".to_string(),
			message: "Shipping details failed validation".to_string(),
			details: serde_json::to_value(&errors).ok(),
		},
		PlaceOrderError::Checkout(CheckoutError::EmptyCart) => APIError::UnprocessableEntity {
			error_type: "EMPTY_CART".to_string(),
			message: "Cart is empty".to_string(),
		},
		PlaceOrderError::Checkout(CheckoutError::Storage(e)) => APIError::InternalServerError {
			message: e.to_string(),
		},
	}
}
