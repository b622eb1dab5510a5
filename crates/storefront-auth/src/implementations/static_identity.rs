//! Static identity provider.
//!
//! Reads a fixed identity from configuration. This is the provider used by
//! single-operator deployments and tests: the service always runs as one
//! configured user. Use the `document` provider when the profile should
//! come from the users collection instead.

use crate::{AuthError, AuthFactory, AuthInterface, AuthRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use storefront_storage::StoreService;
use storefront_types::{
	AuthUser, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, UserRole,
	ValidationError,
};

/// Auth provider returning one identity fixed at startup.
pub struct StaticIdentity {
	user: AuthUser,
}

impl StaticIdentity {
	/// Creates a provider for the given identity.
	pub fn new(user: AuthUser) -> Self {
		Self { user }
	}
}

#[async_trait]
impl AuthInterface for StaticIdentity {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(StaticIdentitySchema)
	}

	async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
		Ok(Some(self.user.clone()))
	}
}

/// Configuration schema for StaticIdentity.
pub struct StaticIdentitySchema;

impl ConfigSchema for StaticIdentitySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![
				Field::new("id", FieldType::String),
				Field::new("username", FieldType::String),
			],
			vec![Field::new("role", FieldType::String).with_validator(|value| {
				match value.as_str().unwrap_or_default() {
					"admin" | "user" => Ok(()),
					other => Err(format!("Unknown role '{}': expected admin or user", other)),
				}
			})],
		)
		.validate(config)
	}
}

/// Registry for the static identity provider.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "static";
	type Factory = AuthFactory;

	fn factory() -> Self::Factory {
		create_auth
	}
}

impl AuthRegistry for Registry {}

/// Factory function to create a static identity provider from configuration.
///
/// Configuration parameters:
/// - `id`: stable account identifier
/// - `username`: display name
/// - `role`: `admin` or `user` (defaults to `user`)
pub fn create_auth(
	config: &toml::Value,
	_store: Arc<StoreService>,
) -> Result<Box<dyn AuthInterface>, AuthError> {
	StaticIdentitySchema
		.validate(config)
		.map_err(|e| AuthError::Configuration(e.to_string()))?;
	let id = config
		.get("id")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AuthError::Configuration("Missing 'id'".into()))?;
	let username = config
		.get("username")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AuthError::Configuration("Missing 'username'".into()))?;
	let role = match config.get("role").and_then(|v| v.as_str()) {
		Some("admin") => UserRole::Operator,
		_ => UserRole::Customer,
	};
	Ok(Box::new(StaticIdentity::new(AuthUser {
		id: id.to_string(),
		username: username.to_string(),
		role,
	})))
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::implementations::memory::MemoryStore;

	fn store() -> Arc<StoreService> {
		Arc::new(StoreService::new(Box::new(MemoryStore::new())))
	}

	#[tokio::test]
	async fn configured_admin_is_an_operator() {
		let config: toml::Value =
			toml::from_str("id = \"op-1\"\nusername = \"operator\"\nrole = \"admin\"").unwrap();
		let auth = create_auth(&config, store()).unwrap();
		let user = auth.current_user().await.unwrap().unwrap();
		assert!(user.is_operator());
		assert_eq!(user.id, "op-1");
	}

	#[tokio::test]
	async fn role_defaults_to_customer() {
		let config: toml::Value = toml::from_str("id = \"u-1\"\nusername = \"sam\"").unwrap();
		let auth = create_auth(&config, store()).unwrap();
		let user = auth.current_user().await.unwrap().unwrap();
		assert!(!user.is_operator());
	}

	#[tokio::test]
	async fn unknown_role_is_rejected() {
		let config: toml::Value =
			toml::from_str("id = \"u-1\"\nusername = \"sam\"\nrole = \"root\"").unwrap();
		assert!(matches!(
			create_auth(&config, store()),
			Err(AuthError::Configuration(_))
		));
	}
}
