//! Lifecycle management for the storefront engine.
//!
//! Handles initialization and shutdown logging around the engine's run
//! loop. The live subscription itself is owned by `run`, which tears it
//! down on exit.

use super::StorefrontEngine;

impl StorefrontEngine {
	/// Performs any initialization required before running.
	pub async fn initialize(&self) -> Result<(), super::EngineError> {
		tracing::info!(id = %self.config.storefront.id, "Initializing storefront engine");
		Ok(())
	}

	/// Performs cleanup operations after the run loop returns.
	pub async fn shutdown(&self) -> Result<(), super::EngineError> {
		tracing::info!("Shutting down storefront engine");
		Ok(())
	}
}
