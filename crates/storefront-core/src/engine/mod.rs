//! Core storefront engine that orchestrates the order lifecycle.
//!
//! This module contains the main StorefrontEngine struct which owns the
//! shared services, keeps the order store fed from the live subscription,
//! and runs the main event loop reacting to storefront events.

pub mod event_bus;
pub mod lifecycle;

use crate::handlers::OrderHandler;
use std::future::Future;
use std::sync::Arc;
use storefront_auth::{AuthError, AuthService};
use storefront_catalog::{
	CartService, CatalogError, FavoritesService, NewProduct, ProductService, ProductUpdate,
};
use storefront_config::Config;
use storefront_orders::{
	orders_feed_query, CheckoutError, CheckoutService, OrderStore, ShippingDetails,
	StatusCoordinator, TransitionOutcome,
};
use storefront_storage::{decode_documents, SnapshotEvent, StoreService, Subscription};
use storefront_types::{
	CatalogEvent, Collection, Document, Order, OrderEvent, Product, StorefrontEvent,
};
use thiserror::Error;
use tokio::sync::Semaphore;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Service error: {0}")]
	Service(String),
	#[error("Order not found: {0}")]
	OrderNotFound(String),
}

/// Errors that can occur while placing an order through the engine.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
	#[error(transparent)]
	Auth(#[from] AuthError),
	#[error(transparent)]
	Checkout(#[from] CheckoutError),
}

/// Maximum number of concurrently running event handlers.
const MAX_CONCURRENT_HANDLERS: usize = 32;

/// Main storefront engine.
///
/// Cheap to clone; every service is behind an `Arc`. The engine is the
/// single owner of the live order subscription: [`StorefrontEngine::run`]
/// opens it, feeds the order store, and tears it down on shutdown.
#[derive(Clone)]
pub struct StorefrontEngine {
	/// Storefront configuration.
	pub(crate) config: Config,
	/// Document-store service all reads and writes go through.
	pub(crate) storage: Arc<StoreService>,
	/// Authentication context.
	pub(crate) auth: Arc<AuthService>,
	/// Client-side order store, the single source of truth for reads.
	pub(crate) orders: Arc<OrderStore>,
	/// Status mutation coordinator.
	pub(crate) coordinator: Arc<StatusCoordinator>,
	/// Checkout service.
	pub(crate) checkout: Arc<CheckoutService>,
	/// Product catalog service.
	pub(crate) products: Arc<ProductService>,
	/// Shopping cart service.
	pub(crate) cart: Arc<CartService>,
	/// Favorites service.
	pub(crate) favorites: Arc<FavoritesService>,
	/// Event bus for inter-service communication.
	pub(crate) event_bus: event_bus::EventBus,
	/// Order event handler.
	pub(crate) order_handler: Arc<OrderHandler>,
}

impl StorefrontEngine {
	/// Creates a new engine over the given services.
	pub fn new(
		config: Config,
		storage: Arc<StoreService>,
		auth: Arc<AuthService>,
		event_bus: event_bus::EventBus,
	) -> Self {
		let orders = Arc::new(OrderStore::new());
		let coordinator = Arc::new(StatusCoordinator::new(orders.clone(), storage.clone()));
		let checkout = Arc::new(CheckoutService::new(storage.clone()));
		let products = Arc::new(ProductService::new(storage.clone()));
		let cart = Arc::new(CartService::new(storage.clone()));
		let favorites = Arc::new(FavoritesService::new(storage.clone()));
		let order_handler = Arc::new(OrderHandler::new(products.clone()));

		Self {
			config,
			storage,
			auth,
			orders,
			coordinator,
			checkout,
			products,
			cart,
			favorites,
			event_bus,
			order_handler,
		}
	}

	/// Main execution loop for the storefront engine.
	///
	/// Opens the live order subscription (unless disabled), then reacts to
	/// feed snapshots and storefront events until interrupted. The
	/// subscription is explicitly stopped on the way out.
	pub async fn run(&self) -> Result<(), EngineError> {
		let mut feed: Option<Subscription> = if self.config.orders.live_feed {
			let subscription = self
				.storage
				.watch(&orders_feed_query())
				.await
				.map_err(|e| EngineError::Service(e.to_string()))?;
			tracing::info!("Live order feed opened");
			Some(subscription)
		} else {
			// Manual refresh is the only way the store fills up.
			self.orders.set_loading(false);
			tracing::info!("Live order feed disabled by configuration");
			None
		};

		let mut event_receiver = self.event_bus.subscribe();
		let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_HANDLERS));

		loop {
			tokio::select! {
				event = next_feed_event(&mut feed), if feed.is_some() => {
					match event {
						Some(SnapshotEvent::Snapshot(documents)) => {
							self.apply_snapshot(documents);
						}
						Some(SnapshotEvent::Lost(message)) => {
							tracing::warn!(error = %message, "Live order feed lost");
							self.orders.record_error(message.clone());
							self.event_bus
								.publish(StorefrontEvent::Order(OrderEvent::FeedLost {
									error: message,
								}));
						}
						None => {
							// The subscription ended; only manual refresh
							// updates the store from here on.
							feed = None;
						}
					}
				}

				Ok(event) = event_receiver.recv() => {
					match event {
						StorefrontEvent::Order(OrderEvent::Placed { order }) => {
							self.spawn_handler(&semaphore, move |engine| async move {
								engine
									.order_handler
									.handle_placed(&order)
									.await
									.map_err(|e| EngineError::Service(e.to_string()))
							})
							.await;
						}
						StorefrontEvent::Order(OrderEvent::StatusChanged {
							order_id,
							from,
							to,
							changed_at,
						}) => {
							self.spawn_handler(&semaphore, move |engine| async move {
								engine
									.order_handler
									.handle_status_changed(&order_id, from, to, changed_at)
									.await
									.map_err(|e| EngineError::Service(e.to_string()))
							})
							.await;
						}
						StorefrontEvent::Order(OrderEvent::SnapshotApplied { count }) => {
							tracing::debug!(count, "Order snapshot applied");
						}
						StorefrontEvent::Order(OrderEvent::FeedLost { .. }) => {}
						StorefrontEvent::Catalog(event) => {
							tracing::debug!(?event, "Catalog event");
						}
					}
				}

				// Shutdown signal
				_ = tokio::signal::ctrl_c() => {
					break;
				}
			}
		}

		if let Some(subscription) = feed {
			subscription.stop().await;
			tracing::info!("Live order feed stopped");
		}

		Ok(())
	}

	/// Replaces the order store contents from a raw feed snapshot.
	///
	/// The snapshot always wins over optimistic local changes.
	fn apply_snapshot(&self, documents: Vec<Document>) {
		let orders: Vec<Order> = decode_documents(Collection::Orders, documents);
		let count = orders.len();
		self.orders.replace_all(orders);
		self.event_bus
			.publish(StorefrontEvent::Order(OrderEvent::SnapshotApplied { count }));
	}

	/// Places an order for the signed-in user and announces it.
	pub async fn place_order(&self, details: &ShippingDetails) -> Result<Order, PlaceOrderError> {
		let user = self.auth.require_user().await?;
		let order = self.checkout.place_order(&user, details).await?;
		self.event_bus
			.publish(StorefrontEvent::Order(OrderEvent::Placed {
				order: order.clone(),
			}));
		Ok(order)
	}

	/// Moves an order one step forward along the status flow.
	pub async fn advance_order(&self, order_id: &str) -> Result<TransitionOutcome, EngineError> {
		self.transition_order(order_id, true).await
	}

	/// Moves an order one step backward along the status flow.
	pub async fn revert_order(&self, order_id: &str) -> Result<TransitionOutcome, EngineError> {
		self.transition_order(order_id, false).await
	}

	async fn transition_order(
		&self,
		order_id: &str,
		forward: bool,
	) -> Result<TransitionOutcome, EngineError> {
		let order = self
			.orders
			.snapshot()
			.iter()
			.find(|order| order.id == order_id)
			.cloned()
			.ok_or_else(|| EngineError::OrderNotFound(order_id.to_string()))?;

		let outcome = if forward {
			self.coordinator.move_next(&order).await
		} else {
			self.coordinator.move_prev(&order).await
		};

		if let TransitionOutcome::Applied { status, changed_at } = outcome {
			self.event_bus
				.publish(StorefrontEvent::Order(OrderEvent::StatusChanged {
					order_id: order.id.clone(),
					from: order.status,
					to: status,
					changed_at,
				}));
		}
		Ok(outcome)
	}

	/// Adds a product to the catalog and announces it.
	pub async fn add_product(&self, submission: NewProduct) -> Result<Product, CatalogError> {
		let product = self.products.create(submission).await?;
		self.event_bus
			.publish(StorefrontEvent::Catalog(CatalogEvent::ProductCreated {
				product: product.clone(),
			}));
		Ok(product)
	}

	/// Applies a partial product update and announces it.
	pub async fn update_product(
		&self,
		product_id: &str,
		update: ProductUpdate,
	) -> Result<(), CatalogError> {
		self.products.update(product_id, update).await?;
		self.event_bus
			.publish(StorefrontEvent::Catalog(CatalogEvent::ProductUpdated {
				product_id: product_id.to_string(),
			}));
		Ok(())
	}

	/// Removes a product from the catalog and announces it.
	pub async fn delete_product(&self, product_id: &str) -> Result<(), CatalogError> {
		self.products.delete(product_id).await?;
		self.event_bus
			.publish(StorefrontEvent::Catalog(CatalogEvent::ProductDeleted {
				product_id: product_id.to_string(),
			}));
		Ok(())
	}

	/// Returns a reference to the event bus.
	pub fn event_bus(&self) -> &event_bus::EventBus {
		&self.event_bus
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns a reference to the document-store service.
	pub fn storage(&self) -> &Arc<StoreService> {
		&self.storage
	}

	/// Returns a reference to the authentication context.
	pub fn auth(&self) -> &Arc<AuthService> {
		&self.auth
	}

	/// Returns a reference to the order store.
	pub fn orders(&self) -> &Arc<OrderStore> {
		&self.orders
	}

	/// Returns a reference to the status coordinator.
	pub fn coordinator(&self) -> &Arc<StatusCoordinator> {
		&self.coordinator
	}

	/// Returns a reference to the product service.
	pub fn products(&self) -> &Arc<ProductService> {
		&self.products
	}

	/// Returns a reference to the cart service.
	pub fn cart(&self) -> &Arc<CartService> {
		&self.cart
	}

	/// Returns a reference to the favorites service.
	pub fn favorites(&self) -> &Arc<FavoritesService> {
		&self.favorites
	}

	/// Helper method to spawn handler tasks with semaphore-based
	/// concurrency control.
	async fn spawn_handler<F, Fut>(&self, semaphore: &Arc<Semaphore>, handler: F)
	where
		F: FnOnce(StorefrontEngine) -> Fut + Send + 'static,
		Fut: Future<Output = Result<(), EngineError>> + Send,
	{
		let engine = self.clone();
		match semaphore.clone().acquire_owned().await {
			Ok(permit) => {
				tokio::spawn(async move {
					let _permit = permit; // Keep permit alive for duration of task
					if let Err(e) = handler(engine).await {
						tracing::error!("Handler error: {}", e);
					}
				});
			}
			Err(e) => {
				tracing::error!("Failed to acquire semaphore permit: {}", e);
			}
		}
	}
}

/// Resolves the next feed event, pending forever when there is no feed.
async fn next_feed_event(feed: &mut Option<Subscription>) -> Option<SnapshotEvent> {
	match feed.as_mut() {
		Some(subscription) => subscription.recv().await,
		None => std::future::pending().await,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal::Decimal;
	use serde_json::json;
	use storefront_auth::implementations::static_identity::StaticIdentity;
	use storefront_storage::implementations::memory::MemoryStore;
	use storefront_types::{AuthUser, OrderStatus, UserRole};

	fn test_config() -> Config {
		r#"
			[storefront]
			id = "storefront-test"

			[storage]
			primary = "memory"
			[storage.implementations.memory]

			[auth]
			primary = "static"
			[auth.implementations.static]
			id = "u1"
			username = "operator"
			role = "admin"
		"#
		.parse()
		.unwrap()
	}

	fn engine() -> StorefrontEngine {
		let storage = Arc::new(StoreService::new(Box::new(MemoryStore::new())));
		let auth = Arc::new(AuthService::new(Box::new(StaticIdentity::new(AuthUser {
			id: "u1".into(),
			username: "operator".into(),
			role: UserRole::Operator,
		}))));
		StorefrontEngine::new(test_config(), storage, auth, event_bus::EventBus::default())
	}

	#[tokio::test]
	async fn snapshot_feeds_the_order_store_and_publishes() {
		let engine = engine();
		let mut events = engine.event_bus().subscribe();

		engine.apply_snapshot(vec![
			Document::new("o1", json!({ "status": "Pending", "createdAt": "2024-03-01T00:00:00Z" })),
			Document::new("bad", json!([])),
		]);

		// The undecodable document is skipped, not fatal.
		assert_eq!(engine.orders().snapshot().len(), 1);
		assert!(!engine.orders().is_loading());
		match events.recv().await.unwrap() {
			StorefrontEvent::Order(OrderEvent::SnapshotApplied { count }) => assert_eq!(count, 1),
			other => panic!("unexpected event: {:?}", other),
		}
	}

	#[tokio::test]
	async fn advance_order_publishes_status_changed() {
		let engine = engine();
		engine
			.storage()
			.create(
				Collection::Orders,
				Some("o1"),
				&json!({
					"status": "Pending",
					"statusHistory": [{ "status": "Pending", "changedAt": "2024-03-01T00:00:00Z" }],
				}),
			)
			.await
			.unwrap();
		engine.coordinator().refresh().await;

		let mut events = engine.event_bus().subscribe();
		let outcome = engine.advance_order("o1").await.unwrap();
		assert!(matches!(
			outcome,
			TransitionOutcome::Applied {
				status: OrderStatus::Processing,
				..
			}
		));
		match events.recv().await.unwrap() {
			StorefrontEvent::Order(OrderEvent::StatusChanged { from, to, .. }) => {
				assert_eq!(from, OrderStatus::Pending);
				assert_eq!(to, OrderStatus::Processing);
			}
			other => panic!("unexpected event: {:?}", other),
		}
	}

	#[tokio::test]
	async fn advance_unknown_order_is_not_found() {
		let engine = engine();
		engine.coordinator().refresh().await;
		assert!(matches!(
			engine.advance_order("missing").await,
			Err(EngineError::OrderNotFound(_))
		));
	}

	#[tokio::test]
	async fn place_order_goes_through_checkout_and_publishes() {
		let engine = engine();
		engine
			.storage()
			.create(
				Collection::Cart,
				Some("c1"),
				&json!({ "userId": "u1", "productId": "p1", "name": "Chair", "price": "50", "quantity": 1 }),
			)
			.await
			.unwrap();

		let mut events = engine.event_bus().subscribe();
		let order = engine
			.place_order(&ShippingDetails {
				full_name: "Sam Doe".into(),
				phone: "+20 100".into(),
				address: "1 Market St".into(),
			})
			.await
			.unwrap();
		assert_eq!(order.total, Decimal::new(50, 0));

		match events.recv().await.unwrap() {
			StorefrontEvent::Order(OrderEvent::Placed { order: placed }) => {
				assert_eq!(placed.id, order.id);
			}
			other => panic!("unexpected event: {:?}", other),
		}
	}
}
