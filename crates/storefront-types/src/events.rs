//! Event types for inter-service communication.
//!
//! This module defines the event system used by the storefront for
//! asynchronous communication between components. Events flow through an
//! event bus allowing services to react to state changes in other parts
//! of the system.

use crate::{Order, OrderStatus, Product};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all storefront events.
///
/// Events are categorized by the service that produces them, allowing
/// consumers to filter and handle specific event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorefrontEvent {
	/// Events from the order lifecycle.
	Order(OrderEvent),
	/// Events from the product catalog.
	Catalog(CatalogEvent),
}

/// Events related to the order lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// Checkout created a new order.
	Placed { order: Order },
	/// A status transition was applied to the local store and its
	/// persistence requested. A remote failure surfaces through the order
	/// store's error state, not through a separate event.
	StatusChanged {
		order_id: String,
		from: OrderStatus,
		to: OrderStatus,
		changed_at: DateTime<Utc>,
	},
	/// The live order feed delivered a fresh snapshot.
	SnapshotApplied { count: usize },
	/// The live order feed reported an error and stopped delivering.
	FeedLost { error: String },
}

/// Events related to the product catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CatalogEvent {
	/// A product was added to the catalog.
	ProductCreated { product: Product },
	/// A product's fields were updated.
	ProductUpdated { product_id: String },
	/// A product was removed from the catalog.
	ProductDeleted { product_id: String },
	/// A product's stock was adjusted by the given delta.
	StockAdjusted { product_id: String, delta: i64 },
}
