//! Checkout: turning a cart into a placed order.
//!
//! Validates the shipping details, snapshots the signed-in user's cart
//! into immutable line items, computes the total once, writes the order
//! document with its seeded status history, and clears the cart. The
//! order number is a random 6-digit display value with no uniqueness
//! guarantee; the document id is the real identifier.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_storage::{StorageError, StoreService};
use storefront_types::{
	AuthUser, CartEntry, Collection, DocumentQuery, LineItem, Order, OrderStatus, SortDirection,
	StatusChange,
};
use thiserror::Error;
use validator::Validate;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
	/// Shipping details failed validation.
	#[error("Invalid shipping details: {0}")]
	Invalid(#[from] validator::ValidationErrors),
	/// The user's cart has no entries.
	#[error("Cart is empty")]
	EmptyCart,
	/// The document store rejected a read or write.
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

/// Shipping details captured at checkout and frozen on the order.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
	/// Recipient name.
	#[validate(length(min = 1, message = "Full name is required"))]
	pub full_name: String,
	/// Contact phone number.
	#[validate(length(min = 1, message = "Phone is required"))]
	pub phone: String,
	/// Delivery address.
	#[validate(length(min = 1, message = "Address is required"))]
	pub address: String,
}

impl ShippingDetails {
	/// Returns a copy with surrounding whitespace removed, so validation
	/// rejects whitespace-only input.
	fn trimmed(&self) -> Self {
		Self {
			full_name: self.full_name.trim().to_string(),
			phone: self.phone.trim().to_string(),
			address: self.address.trim().to_string(),
		}
	}
}

/// Service that places orders from the current cart.
pub struct CheckoutService {
	storage: Arc<StoreService>,
}

impl CheckoutService {
	/// Creates a checkout service over the given document store.
	pub fn new(storage: Arc<StoreService>) -> Self {
		Self { storage }
	}

	/// Places an order for the signed-in user.
	///
	/// On success the order document exists remotely, the cart entries are
	/// deleted, and the returned order carries the store-assigned id. The
	/// live order feed picks the new order up on its next snapshot.
	pub async fn place_order(
		&self,
		user: &AuthUser,
		details: &ShippingDetails,
	) -> Result<Order, CheckoutError> {
		let details = details.trimmed();
		details.validate()?;

		let query =
			DocumentQuery::ordered_by(Collection::Cart, "name", SortDirection::Ascending)
				.where_eq("userId", user.id.clone());
		let entries: Vec<CartEntry> = self.storage.fetch_all(&query).await?;
		if entries.is_empty() {
			return Err(CheckoutError::EmptyCart);
		}

		let items: Vec<LineItem> = entries.iter().map(line_item).collect();
		let total: Decimal = items.iter().map(LineItem::line_total).sum();
		let now = Utc::now();

		let mut order = Order {
			id: String::new(),
			order_number: Some(random_order_number()),
			user_id: user.id.clone(),
			full_name: details.full_name,
			phone: details.phone,
			address: details.address,
			items,
			total,
			status: OrderStatus::Pending,
			status_history: vec![StatusChange {
				status: OrderStatus::Pending,
				changed_at: now,
			}],
			created_at: Some(now),
			updated_at: Some(now),
		};
		order.id = self.storage.create(Collection::Orders, None, &order).await?;

		// The order is placed; emptying the cart comes after so a failure
		// here can never lose a paid order.
		for entry in &entries {
			self.storage.remove(Collection::Cart, &entry.id).await?;
		}

		tracing::info!(
			order_id = %order.id,
			order_number = order.order_number.unwrap_or_default(),
			items = order.items.len(),
			"Order placed"
		);
		Ok(order)
	}
}

/// Snapshots one cart entry into an order line item, substituting the
/// same fallbacks the storefront has always used for sparse entries.
fn line_item(entry: &CartEntry) -> LineItem {
	LineItem {
		product_id: if entry.product_id.is_empty() {
			entry.id.clone()
		} else {
			entry.product_id.clone()
		},
		name: if entry.name.is_empty() {
			"Unnamed Product".to_string()
		} else {
			entry.name.clone()
		},
		desc: String::new(),
		price: entry.price,
		quantity: entry.quantity.max(1),
		image: entry.image.clone(),
	}
}

/// Random 6-digit display number. Not unique, never used to identify.
fn random_order_number() -> u32 {
	let entropy = uuid::Uuid::new_v4().as_u128();
	100_000 + (entropy % 900_000) as u32
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use storefront_storage::implementations::memory::MemoryStore;
	use storefront_types::UserRole;

	fn user() -> AuthUser {
		AuthUser {
			id: "u1".into(),
			username: "sam".into(),
			role: UserRole::Customer,
		}
	}

	fn details() -> ShippingDetails {
		ShippingDetails {
			full_name: "  Sam Doe ".into(),
			phone: "+20 100 000 0000".into(),
			address: "1 Market St".into(),
		}
	}

	async fn storage_with_cart() -> Arc<StoreService> {
		let storage = Arc::new(StoreService::new(Box::new(MemoryStore::new())));
		storage
			.create(
				Collection::Cart,
				Some("c1"),
				&json!({
					"userId": "u1", "productId": "p1", "name": "Chair",
					"price": "125.50", "quantity": 2,
				}),
			)
			.await
			.unwrap();
		storage
			.create(
				Collection::Cart,
				Some("c2"),
				&json!({ "userId": "u1", "productId": "p2", "price": "10", "quantity": 0 }),
			)
			.await
			.unwrap();
		// Another user's cart must not leak into this checkout.
		storage
			.create(
				Collection::Cart,
				Some("c3"),
				&json!({ "userId": "u2", "productId": "p3", "price": "99", "quantity": 1 }),
			)
			.await
			.unwrap();
		storage
	}

	#[tokio::test]
	async fn place_order_snapshots_cart_and_clears_it() {
		let storage = storage_with_cart().await;
		let checkout = CheckoutService::new(storage.clone());

		let order = checkout.place_order(&user(), &details()).await.unwrap();

		assert!(!order.id.is_empty());
		assert_eq!(order.full_name, "Sam Doe");
		assert_eq!(order.status, OrderStatus::Pending);
		assert_eq!(order.status_history.len(), 1);
		assert_eq!(order.items.len(), 2);
		// 2 x 125.50 + 1 x 10 (zero quantity is floored to one).
		assert_eq!(order.total, Decimal::new(26100, 2));
		let sparse = order.items.iter().find(|i| i.product_id == "p2").unwrap();
		assert_eq!(sparse.name, "Unnamed Product");
		assert_eq!(sparse.quantity, 1);
		let number = order.order_number.unwrap();
		assert!((100_000..1_000_000).contains(&number));

		// The order document is readable back with the same content.
		let remote: Order = storage.fetch(Collection::Orders, &order.id).await.unwrap();
		assert_eq!(remote.total, order.total);
		assert_eq!(remote.user_id, "u1");

		// This user's cart is gone; the other user's is untouched.
		let mine: Vec<CartEntry> = storage
			.fetch_all(
				&DocumentQuery::ordered_by(Collection::Cart, "name", SortDirection::Ascending)
					.where_eq("userId", "u1"),
			)
			.await
			.unwrap();
		assert!(mine.is_empty());
		assert!(storage
			.fetch::<CartEntry>(Collection::Cart, "c3")
			.await
			.is_ok());
	}

	#[tokio::test]
	async fn empty_cart_is_rejected() {
		let storage = Arc::new(StoreService::new(Box::new(MemoryStore::new())));
		let checkout = CheckoutService::new(storage);
		assert!(matches!(
			checkout.place_order(&user(), &details()).await,
			Err(CheckoutError::EmptyCart)
		));
	}

	#[tokio::test]
	async fn whitespace_only_details_are_rejected() {
		let storage = storage_with_cart().await;
		let checkout = CheckoutService::new(storage);
		let bad = ShippingDetails {
			full_name: "   ".into(),
			..details()
		};
		assert!(matches!(
			checkout.place_order(&user(), &bad).await,
			Err(CheckoutError::Invalid(_))
		));
	}
}
