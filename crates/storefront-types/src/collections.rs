//! Collection names for the document store.

use std::str::FromStr;

/// Document collections used by the storefront.
///
/// This enum provides type safety for document-store operations by
/// replacing string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
	/// Placed orders.
	Orders,
	/// Product catalog.
	Products,
	/// Per-user shopping cart entries.
	Cart,
	/// Per-user favorite product lists.
	Favorites,
	/// User profiles.
	Users,
}

impl Collection {
	/// Returns the string representation of the collection.
	pub fn as_str(&self) -> &'static str {
		match self {
			Collection::Orders => "orders",
			Collection::Products => "products",
			Collection::Cart => "cart",
			Collection::Favorites => "favorites",
			Collection::Users => "users",
		}
	}

	/// Returns an iterator over all Collection variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Orders,
			Self::Products,
			Self::Cart,
			Self::Favorites,
			Self::Users,
		]
		.into_iter()
	}
}

impl std::fmt::Display for Collection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Collection {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"orders" => Ok(Self::Orders),
			"products" => Ok(Self::Products),
			"cart" => Ok(Self::Cart),
			"favorites" => Ok(Self::Favorites),
			"users" => Ok(Self::Users),
			_ => Err(()),
		}
	}
}

impl From<Collection> for &'static str {
	fn from(collection: Collection) -> Self {
		collection.as_str()
	}
}
