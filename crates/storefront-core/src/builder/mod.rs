//! Builder pattern for constructing storefront engines.
//!
//! Provides a flexible way to compose a StorefrontEngine from pluggable
//! implementations using factory functions: document-store backends and
//! authentication providers are both selected by name from configuration.

use crate::engine::{event_bus::EventBus, StorefrontEngine};
use std::collections::HashMap;
use std::sync::Arc;
use storefront_auth::{AuthError, AuthInterface, AuthService};
use storefront_config::Config;
use storefront_storage::{DocumentStoreInterface, StorageError, StoreService};
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Container for all factory functions needed to build a StorefrontEngine.
///
/// Each factory takes its own TOML configuration section and returns the
/// corresponding implementation; auth factories additionally receive the
/// document store, since providers may look profiles up in it.
pub struct StorefrontFactories<SF, AF> {
	pub storage_factories: HashMap<String, SF>,
	pub auth_factories: HashMap<String, AF>,
}

/// Builder for constructing a StorefrontEngine with pluggable
/// implementations.
pub struct StorefrontBuilder {
	config: Config,
}

impl StorefrontBuilder {
	/// Creates a new StorefrontBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the StorefrontEngine using factories for each component type.
	pub async fn build<SF, AF>(
		self,
		factories: StorefrontFactories<SF, AF>,
	) -> Result<StorefrontEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn DocumentStoreInterface>, StorageError>,
		AF: Fn(&toml::Value, Arc<StoreService>) -> Result<Box<dyn AuthInterface>, AuthError>,
	{
		// Create storage implementations
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			if let Some(factory) = factories.storage_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						// Validation already happened in the factory
						storage_impls.insert(name.clone(), implementation);
						let is_primary = &self.config.storage.primary == name;
						tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
					}
					Err(e) => {
						tracing::error!(
							component = "storage",
							implementation = %name,
							error = %e,
							"Failed to create storage implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create storage implementation '{}': {}",
							name, e
						)));
					}
				}
			}
		}

		if storage_impls.is_empty() {
			return Err(BuilderError::Config(
				"No valid storage implementations available".into(),
			));
		}

		// Get the primary storage implementation
		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;

		let storage = Arc::new(StoreService::new(storage_backend));

		// Create the primary auth implementation; providers get the store
		// for profile lookups.
		let primary_auth = &self.config.auth.primary;
		let auth_config = self
			.config
			.auth
			.implementations
			.get(primary_auth)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!(
					"Auth implementation '{}' is not configured",
					primary_auth
				))
			})?;
		let auth_factory = factories.auth_factories.get(primary_auth).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"No factory registered for auth implementation '{}'",
				primary_auth
			))
		})?;
		let auth_backend = auth_factory(auth_config, storage.clone()).map_err(|e| {
			tracing::error!(
				component = "auth",
				implementation = %primary_auth,
				error = %e,
				"Failed to create auth implementation"
			);
			BuilderError::Config(format!(
				"Failed to create auth implementation '{}': {}",
				primary_auth, e
			))
		})?;
		tracing::info!(component = "auth", implementation = %primary_auth, enabled = true, "Loaded");
		let auth = Arc::new(AuthService::new(auth_backend));

		let event_bus = EventBus::default();
		Ok(StorefrontEngine::new(self.config, storage, auth, event_bus))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_auth::AuthFactory;
	use storefront_storage::StoreFactory;

	fn factories() -> StorefrontFactories<StoreFactory, AuthFactory> {
		StorefrontFactories {
			storage_factories: storefront_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			auth_factories: storefront_auth::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	const CONFIG: &str = r#"
		[storefront]
		id = "storefront-test"

		[storage]
		primary = "memory"
		[storage.implementations.memory]

		[auth]
		primary = "static"
		[auth.implementations.static]
		id = "op-1"
		username = "operator"
		role = "admin"
	"#;

	#[tokio::test]
	async fn builds_an_engine_from_registered_factories() {
		let config: Config = CONFIG.parse().unwrap();
		let engine = StorefrontBuilder::new(config)
			.build(factories())
			.await
			.unwrap();
		let user = engine.auth().current_user().await.unwrap().unwrap();
		assert!(user.is_operator());
	}

	#[tokio::test]
	async fn missing_auth_factory_fails_the_build() {
		let config: Config = CONFIG.parse().unwrap();
		let mut incomplete = factories();
		incomplete.auth_factories.clear();
		assert!(matches!(
			StorefrontBuilder::new(config).build(incomplete).await,
			Err(BuilderError::MissingComponent(_))
		));
	}
}
