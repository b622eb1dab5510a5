//! Order lifecycle module for the storefront system.
//!
//! This module owns the order side of the storefront: the fixed status
//! flow and its transition policy, the client-side order store fed by the
//! live subscription, the mutation coordinator that applies status changes
//! optimistically before persisting them, the pure filter/search/sort
//! views the dashboard reads, and checkout, which turns a cart into a
//! placed order.

pub mod checkout;
pub mod coordinator;
pub mod flow;
pub mod store;
pub mod views;

pub use checkout::{CheckoutError, CheckoutService, ShippingDetails};
pub use coordinator::{StatusCoordinator, TransitionOutcome};
pub use store::OrderStore;
pub use views::{status_counts, OrderView, StatusFilter};

use storefront_types::{Collection, DocumentQuery, SortDirection};

/// The query the live order feed and the manual refresh both use: the
/// full order collection, newest first.
pub fn orders_feed_query() -> DocumentQuery {
	DocumentQuery::ordered_by(Collection::Orders, "createdAt", SortDirection::Descending)
}
