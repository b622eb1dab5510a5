//! Core storefront engine that wires the order lifecycle together.
//!
//! This crate contains the main StorefrontEngine struct which owns the
//! shared services (document store, auth, orders, catalog), manages the
//! live order subscription, and runs the event loop that reacts to
//! storefront events such as placed orders and status changes.

pub mod builder;
pub mod engine;
pub mod handlers;

pub use builder::{BuilderError, StorefrontBuilder, StorefrontFactories};
pub use engine::event_bus::EventBus;
pub use engine::{EngineError, PlaceOrderError, StorefrontEngine};
