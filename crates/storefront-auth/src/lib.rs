//! Authentication context module for the storefront system.
//!
//! Authentication is delegated entirely to an external identity provider;
//! this module only exposes the read-only `current_user` dependency the
//! rest of the system consumes. Nothing in the storefront mutates the
//! identity provider.

use async_trait::async_trait;
use std::sync::Arc;
use storefront_storage::StoreService;
use storefront_types::{AuthUser, ConfigSchema, ImplementationRegistry};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod document;
	pub mod static_identity;
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
	/// Error that occurs when the identity provider cannot be reached.
	#[error("Provider error: {0}")]
	Provider(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for authentication providers.
///
/// Implementations expose the currently signed-in identity, or `None`
/// when nobody is signed in. The identity is read-only for every caller.
#[async_trait]
pub trait AuthInterface: Send + Sync {
	/// Returns the configuration schema for this auth implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Returns the currently signed-in user, if any.
	async fn current_user(&self) -> Result<Option<AuthUser>, AuthError>;
}

/// Type alias for auth factory functions.
///
/// Auth providers may consult the document store (profile lookups), so the
/// factory receives the store service alongside its own configuration.
pub type AuthFactory =
	fn(&toml::Value, Arc<StoreService>) -> Result<Box<dyn AuthInterface>, AuthError>;

/// Registry trait for auth implementations.
pub trait AuthRegistry: ImplementationRegistry<Factory = AuthFactory> {}

/// Get all registered auth implementations.
///
/// Returns a vector of (name, factory) tuples for all available providers.
pub fn get_all_implementations() -> Vec<(&'static str, AuthFactory)> {
	use implementations::{document, static_identity};

	vec![
		(
			static_identity::Registry::NAME,
			static_identity::Registry::factory(),
		),
		(document::Registry::NAME, document::Registry::factory()),
	]
}

/// Service that manages authentication context lookups.
///
/// This struct provides a high-level interface for the rest of the system,
/// wrapping the configured provider implementation.
pub struct AuthService {
	/// The underlying auth implementation.
	implementation: Box<dyn AuthInterface>,
}

impl AuthService {
	/// Creates a new AuthService with the specified implementation.
	pub fn new(implementation: Box<dyn AuthInterface>) -> Self {
		Self { implementation }
	}

	/// Returns the currently signed-in user, if any.
	pub async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
		self.implementation.current_user().await
	}

	/// Returns the signed-in user or a provider error when nobody is.
	///
	/// Convenience for call sites that require a signed-in user, like
	/// checkout and the cart operations.
	pub async fn require_user(&self) -> Result<AuthUser, AuthError> {
		self.current_user()
			.await?
			.ok_or_else(|| AuthError::Provider("No user is signed in".into()))
	}
}
