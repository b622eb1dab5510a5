//! Common types module for the storefront system.
//!
//! This module defines the core data types and structures shared by every
//! storefront crate. It provides a centralized location for the domain
//! model so all components agree on one representation of orders,
//! products, carts, users and the documents they are decoded from.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Cart entry types for the shopping cart collection.
pub mod cart;
/// Collection names used by the document store.
pub mod collections;
/// Raw document, query and patch types for the document-store boundary.
pub mod document;
/// Event types for inter-service communication.
pub mod events;
/// Order types including line items, statuses and status history.
pub mod order;
/// Product catalog types.
pub mod product;
/// Registry trait for self-registering implementations.
pub mod registry;
/// User identity and profile types.
pub mod user;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use cart::*;
pub use collections::*;
pub use document::*;
pub use events::*;
pub use order::*;
pub use product::*;
pub use registry::*;
pub use user::*;
pub use validation::*;
