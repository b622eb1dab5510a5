//! User identity and profile types.

use serde::{Deserialize, Serialize};

/// Role stored on a user profile document.
///
/// The document store keeps the original string values (`admin`, `user`);
/// the typed model names them by what they mean here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
	/// Operator with access to the admin surfaces (product management,
	/// order status transitions).
	#[serde(rename = "admin")]
	Operator,
	/// Regular storefront customer.
	#[default]
	#[serde(rename = "user")]
	Customer,
}

/// The identity the authentication collaborator exposes.
///
/// Read-only for every storefront component; nothing in this system
/// mutates the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
	/// Stable account identifier.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub username: String,
	/// Role controlling access to admin surfaces.
	#[serde(default)]
	pub role: UserRole,
}

impl AuthUser {
	/// Returns true when this identity may use the admin surfaces.
	pub fn is_operator(&self) -> bool {
		self.role == UserRole::Operator
	}
}

/// A user profile document from the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	/// Profile document id (the account id).
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub username: String,
	/// Contact email, when the profile carries one.
	#[serde(default)]
	pub email: Option<String>,
	/// Role stored as `userType` on the original documents.
	#[serde(default, rename = "userType")]
	pub user_type: UserRole,
}

impl From<UserProfile> for AuthUser {
	fn from(profile: UserProfile) -> Self {
		Self {
			id: profile.id,
			username: profile.username,
			role: profile.user_type,
		}
	}
}
