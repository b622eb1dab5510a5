//! Event handlers for the storefront engine.

pub mod order;

pub use order::OrderHandler;
