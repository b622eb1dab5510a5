//! Document-backed identity provider.
//!
//! The external identity provider supplies a stable account id; the
//! matching profile document in the `users` collection supplies the
//! display name and role. A missing profile is not an error — the account
//! is still signed in, it just has no profile yet, and decodes to the
//! customer role.

use crate::{AuthError, AuthFactory, AuthInterface, AuthRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use storefront_storage::{StorageError, StoreService};
use storefront_types::{
	AuthUser, Collection, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema,
	UserProfile, ValidationError,
};

/// Auth provider resolving the profile from the users collection.
pub struct DocumentIdentity {
	store: Arc<StoreService>,
	user_id: String,
}

impl DocumentIdentity {
	/// Creates a provider for the given account id.
	pub fn new(store: Arc<StoreService>, user_id: impl Into<String>) -> Self {
		Self {
			store,
			user_id: user_id.into(),
		}
	}
}

#[async_trait]
impl AuthInterface for DocumentIdentity {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(DocumentIdentitySchema)
	}

	async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
		match self
			.store
			.fetch::<UserProfile>(Collection::Users, &self.user_id)
			.await
		{
			Ok(profile) => Ok(Some(profile.into())),
			Err(StorageError::NotFound) => Ok(Some(AuthUser {
				id: self.user_id.clone(),
				username: String::new(),
				role: Default::default(),
			})),
			Err(e) => Err(AuthError::Provider(e.to_string())),
		}
	}
}

/// Configuration schema for DocumentIdentity.
pub struct DocumentIdentitySchema;

impl ConfigSchema for DocumentIdentitySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![Field::new("user_id", FieldType::String)], vec![]).validate(config)
	}
}

/// Registry for the document identity provider.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "document";
	type Factory = AuthFactory;

	fn factory() -> Self::Factory {
		create_auth
	}
}

impl AuthRegistry for Registry {}

/// Factory function to create a document identity provider.
///
/// Configuration parameters:
/// - `user_id`: account id whose profile is looked up in `users`
pub fn create_auth(
	config: &toml::Value,
	store: Arc<StoreService>,
) -> Result<Box<dyn AuthInterface>, AuthError> {
	DocumentIdentitySchema
		.validate(config)
		.map_err(|e| AuthError::Configuration(e.to_string()))?;
	let user_id = config
		.get("user_id")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AuthError::Configuration("Missing 'user_id'".into()))?;
	Ok(Box::new(DocumentIdentity::new(store, user_id)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use storefront_storage::implementations::memory::MemoryStore;
	use storefront_types::UserRole;

	async fn store_with_profile() -> Arc<StoreService> {
		let store = StoreService::new(Box::new(MemoryStore::new()));
		store
			.create(
				Collection::Users,
				Some("u-7"),
				&json!({ "username": "amira", "userType": "admin", "email": "a@example.com" }),
			)
			.await
			.unwrap();
		Arc::new(store)
	}

	#[tokio::test]
	async fn profile_fields_resolve_into_the_identity() {
		let auth = DocumentIdentity::new(store_with_profile().await, "u-7");
		let user = auth.current_user().await.unwrap().unwrap();
		assert_eq!(user.username, "amira");
		assert_eq!(user.role, UserRole::Operator);
	}

	#[tokio::test]
	async fn missing_profile_still_signs_in_as_customer() {
		let auth = DocumentIdentity::new(store_with_profile().await, "u-unknown");
		let user = auth.current_user().await.unwrap().unwrap();
		assert_eq!(user.id, "u-unknown");
		assert_eq!(user.role, UserRole::Customer);
		assert!(user.username.is_empty());
	}
}
