//! Per-user shopping cart operations.
//!
//! Cart entries denormalize the product snapshot at add time. Quantity
//! changes apply a compensating stock adjustment on the product, the way
//! the storefront has always reserved stock from the cart.

use rust_decimal::Decimal;
use std::sync::Arc;
use storefront_storage::{StorageError, StoreService};
use storefront_types::{
	AuthUser, CartEntry, Collection, DocumentPatch, DocumentQuery, Product, SortDirection,
};
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
	/// The entry does not exist or belongs to another user.
	#[error("Cart entry not found: {0}")]
	NotFound(String),
	/// The document store rejected a read or write.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<StorageError> for CartError {
	fn from(e: StorageError) -> Self {
		CartError::Storage(e.to_string())
	}
}

/// Service managing per-user shopping carts.
pub struct CartService {
	storage: Arc<StoreService>,
}

impl CartService {
	/// Creates a cart service over the given document store.
	pub fn new(storage: Arc<StoreService>) -> Self {
		Self { storage }
	}

	fn entries_query(user_id: &str) -> DocumentQuery {
		DocumentQuery::ordered_by(Collection::Cart, "name", SortDirection::Ascending)
			.where_eq("userId", user_id)
	}

	/// Lists the user's cart entries.
	pub async fn entries(&self, user: &AuthUser) -> Result<Vec<CartEntry>, CartError> {
		Ok(self.storage.fetch_all(&Self::entries_query(&user.id)).await?)
	}

	/// Adds a product to the user's cart.
	///
	/// An existing entry for the same product has its quantity increased
	/// instead of creating a duplicate.
	pub async fn add(
		&self,
		user: &AuthUser,
		product: &Product,
		quantity: u32,
	) -> Result<CartEntry, CartError> {
		let quantity = quantity.max(1);
		let existing = self
			.entries(user)
			.await?
			.into_iter()
			.find(|entry| entry.product_id == product.id);

		if let Some(entry) = existing {
			let merged = entry.quantity.saturating_add(quantity);
			self.set_entry_quantity(&entry.id, merged).await?;
			return Ok(CartEntry {
				quantity: merged,
				..entry
			});
		}

		let mut entry = CartEntry {
			id: String::new(),
			user_id: user.id.clone(),
			product_id: product.id.clone(),
			name: product.name.clone(),
			price: product.price,
			quantity,
			checked: true,
			image: product.image_url.clone(),
		};
		entry.id = self.storage.create(Collection::Cart, None, &entry).await?;
		Ok(entry)
	}

	/// Fetches one of the user's entries, hiding other users' entries.
	async fn owned_entry(&self, user: &AuthUser, entry_id: &str) -> Result<CartEntry, CartError> {
		let entry: CartEntry = self
			.storage
			.fetch(Collection::Cart, entry_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => CartError::NotFound(entry_id.to_string()),
				other => other.into(),
			})?;
		if entry.user_id != user.id {
			return Err(CartError::NotFound(entry_id.to_string()));
		}
		Ok(entry)
	}

	async fn set_entry_quantity(&self, entry_id: &str, quantity: u32) -> Result<(), CartError> {
		let patch = DocumentPatch::new()
			.set("quantity", &quantity)
			.map_err(|e| CartError::Storage(e.to_string()))?;
		Ok(self.storage.patch(Collection::Cart, entry_id, &patch).await?)
	}

	/// Sets an entry's quantity and applies the compensating stock
	/// adjustment on the product.
	///
	/// Raising the quantity by N takes N units off the product's stock;
	/// lowering it gives them back. A product that has disappeared from
	/// the catalog skips the adjustment.
	pub async fn set_quantity(
		&self,
		user: &AuthUser,
		entry_id: &str,
		quantity: u32,
	) -> Result<(), CartError> {
		let quantity = quantity.max(1);
		let entry = self.owned_entry(user, entry_id).await?;
		if entry.quantity == quantity {
			return Ok(());
		}
		self.set_entry_quantity(entry_id, quantity).await?;

		let delta = entry.quantity as i64 - quantity as i64;
		if let Err(e) = self.adjust_product_stock(&entry.product_id, delta).await {
			tracing::warn!(
				product_id = %entry.product_id,
				error = %e,
				"Skipping stock adjustment for missing product"
			);
		}
		Ok(())
	}

	async fn adjust_product_stock(&self, product_id: &str, delta: i64) -> Result<(), CartError> {
		let product: Product = self.storage.fetch(Collection::Products, product_id).await?;
		let new_stock = (product.stock as i64 + delta).max(0) as u32;
		let patch = DocumentPatch::new()
			.set("stock", &new_stock)
			.map_err(|e| CartError::Storage(e.to_string()))?
			.touch("updatedAt");
		Ok(self
			.storage
			.patch(Collection::Products, product_id, &patch)
			.await?)
	}

	/// Toggles an entry's checked flag.
	pub async fn toggle_checked(&self, user: &AuthUser, entry_id: &str) -> Result<bool, CartError> {
		let entry = self.owned_entry(user, entry_id).await?;
		let checked = !entry.checked;
		let patch = DocumentPatch::new()
			.set("checked", &checked)
			.map_err(|e| CartError::Storage(e.to_string()))?;
		self.storage.patch(Collection::Cart, entry_id, &patch).await?;
		Ok(checked)
	}

	/// Removes one entry from the user's cart.
	pub async fn remove(&self, user: &AuthUser, entry_id: &str) -> Result<(), CartError> {
		// Ownership check first; the delete itself cannot distinguish.
		self.owned_entry(user, entry_id).await?;
		Ok(self.storage.remove(Collection::Cart, entry_id).await?)
	}

	/// Removes every checked entry, returning how many were deleted.
	pub async fn remove_checked(&self, user: &AuthUser) -> Result<usize, CartError> {
		let checked: Vec<CartEntry> = self
			.entries(user)
			.await?
			.into_iter()
			.filter(|entry| entry.checked)
			.collect();
		for entry in &checked {
			self.storage.remove(Collection::Cart, &entry.id).await?;
		}
		Ok(checked.len())
	}
}

/// Sum of price x quantity over the checked entries.
pub fn cart_total(entries: &[CartEntry]) -> Decimal {
	entries
		.iter()
		.filter(|entry| entry.checked)
		.map(CartEntry::line_total)
		.sum()
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::implementations::memory::MemoryStore;
	use storefront_types::{Category, UserRole};

	fn user(id: &str) -> AuthUser {
		AuthUser {
			id: id.into(),
			username: String::new(),
			role: UserRole::Customer,
		}
	}

	fn lamp(stock: u32) -> Product {
		Product {
			id: "p-lamp".into(),
			name: "Brass lamp".into(),
			description: String::new(),
			price: Decimal::new(4500, 2),
			stock,
			category: Some(Category::Lamps),
			image_url: None,
			image_path: None,
			created_at: None,
			updated_at: None,
		}
	}

	async fn setup() -> (Arc<StoreService>, CartService) {
		let storage = Arc::new(StoreService::new(Box::new(MemoryStore::new())));
		storage
			.create(Collection::Products, Some("p-lamp"), &lamp(10))
			.await
			.unwrap();
		let cart = CartService::new(storage.clone());
		(storage, cart)
	}

	#[tokio::test]
	async fn adding_the_same_product_merges_quantities() {
		let (_storage, cart) = setup().await;
		let u = user("u1");
		cart.add(&u, &lamp(10), 1).await.unwrap();
		let merged = cart.add(&u, &lamp(10), 2).await.unwrap();
		assert_eq!(merged.quantity, 3);
		assert_eq!(cart.entries(&u).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn quantity_change_adjusts_product_stock() {
		let (storage, cart) = setup().await;
		let u = user("u1");
		let entry = cart.add(&u, &lamp(10), 1).await.unwrap();

		cart.set_quantity(&u, &entry.id, 4).await.unwrap();
		let product: Product = storage.fetch(Collection::Products, "p-lamp").await.unwrap();
		assert_eq!(product.stock, 7);

		cart.set_quantity(&u, &entry.id, 2).await.unwrap();
		let product: Product = storage.fetch(Collection::Products, "p-lamp").await.unwrap();
		assert_eq!(product.stock, 9);
	}

	#[tokio::test]
	async fn entries_are_scoped_to_their_owner() {
		let (_storage, cart) = setup().await;
		let mine = cart.add(&user("u1"), &lamp(10), 1).await.unwrap();

		assert!(cart.entries(&user("u2")).await.unwrap().is_empty());
		assert!(matches!(
			cart.remove(&user("u2"), &mine.id).await,
			Err(CartError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn remove_checked_deletes_only_checked_entries() {
		let (_storage, cart) = setup().await;
		let u = user("u1");
		let first = cart.add(&u, &lamp(10), 1).await.unwrap();
		let mut other = lamp(10);
		other.id = "p-chair".into();
		other.name = "Oak chair".into();
		cart.add(&u, &other, 1).await.unwrap();

		cart.toggle_checked(&u, &first.id).await.unwrap();
		let removed = cart.remove_checked(&u).await.unwrap();
		assert_eq!(removed, 1);
		let remaining = cart.entries(&u).await.unwrap();
		assert_eq!(remaining.len(), 1);
		assert_eq!(remaining[0].product_id, "p-lamp");
	}

	#[tokio::test]
	async fn total_sums_checked_entries_only() {
		let (_storage, cart) = setup().await;
		let u = user("u1");
		let first = cart.add(&u, &lamp(10), 2).await.unwrap();
		let mut other = lamp(10);
		other.id = "p-chair".into();
		other.price = Decimal::new(10000, 2);
		cart.add(&u, &other, 1).await.unwrap();

		let entries = cart.entries(&u).await.unwrap();
		assert_eq!(cart_total(&entries), Decimal::new(19000, 2));

		cart.toggle_checked(&u, &first.id).await.unwrap();
		let entries = cart.entries(&u).await.unwrap();
		assert_eq!(cart_total(&entries), Decimal::new(10000, 2));
	}
}
