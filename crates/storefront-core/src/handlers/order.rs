//! Order handler reacting to order lifecycle events.
//!
//! Commits the stock side effects of a placed order and writes the audit
//! trail for status transitions.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use storefront_catalog::ProductService;
use storefront_types::{Order, OrderStatus};
use thiserror::Error;

/// Errors that can occur while handling order events.
#[derive(Debug, Error)]
pub enum HandlerError {
	#[error("Service error: {0}")]
	Service(String),
}

/// Handler for order lifecycle events.
pub struct OrderHandler {
	products: Arc<ProductService>,
}

impl OrderHandler {
	pub fn new(products: Arc<ProductService>) -> Self {
		Self { products }
	}

	/// Commits the stock decrement for every line item of a placed order.
	///
	/// A line whose product has disappeared from the catalog is logged and
	/// skipped; the order itself is already placed and must not fail here.
	pub async fn handle_placed(&self, order: &Order) -> Result<(), HandlerError> {
		for item in &order.items {
			match self
				.products
				.adjust_stock(&item.product_id, -(item.quantity as i64))
				.await
			{
				Ok(remaining) => {
					tracing::debug!(
						order_id = %order.id,
						product_id = %item.product_id,
						remaining,
						"Stock committed for order line"
					);
				}
				Err(e) => {
					tracing::warn!(
						order_id = %order.id,
						product_id = %item.product_id,
						error = %e,
						"Could not commit stock for order line"
					);
				}
			}
		}
		Ok(())
	}

	/// Writes the audit line for a status transition.
	pub async fn handle_status_changed(
		&self,
		order_id: &str,
		from: OrderStatus,
		to: OrderStatus,
		changed_at: DateTime<Utc>,
	) -> Result<(), HandlerError> {
		tracing::info!(
			order_id,
			from = %from,
			to = %to,
			changed_at = %changed_at,
			"Order status changed"
		);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal::Decimal;
	use storefront_catalog::NewProduct;
	use storefront_storage::implementations::memory::MemoryStore;
	use storefront_storage::StoreService;
	use storefront_types::{Category, LineItem, StatusChange};

	#[tokio::test]
	async fn placed_order_decrements_stock_per_line_item() {
		let storage = Arc::new(StoreService::new(Box::new(MemoryStore::new())));
		let products = Arc::new(ProductService::new(storage.clone()));
		let product = products
			.create(NewProduct {
				name: "Oak table".into(),
				description: "A sturdy oak table.".into(),
				price: Decimal::new(50000, 2),
				stock: 10,
				category: Category::Tables,
				image_url: None,
				image_path: None,
			})
			.await
			.unwrap();

		let now = Utc::now();
		let order = Order {
			id: "o1".into(),
			order_number: Some(123456),
			user_id: "u1".into(),
			full_name: "Sam Doe".into(),
			phone: String::new(),
			address: String::new(),
			items: vec![
				LineItem {
					product_id: product.id.clone(),
					name: product.name.clone(),
					desc: String::new(),
					price: product.price,
					quantity: 3,
					image: None,
				},
				// A line for a product the catalog no longer has.
				LineItem {
					product_id: "gone".into(),
					name: "Ghost".into(),
					desc: String::new(),
					price: Decimal::ONE,
					quantity: 1,
					image: None,
				},
			],
			total: Decimal::new(150000, 2),
			status: OrderStatus::Pending,
			status_history: vec![StatusChange {
				status: OrderStatus::Pending,
				changed_at: now,
			}],
			created_at: Some(now),
			updated_at: Some(now),
		};

		let handler = OrderHandler::new(products.clone());
		handler.handle_placed(&order).await.unwrap();

		let updated = products.get(&product.id).await.unwrap();
		assert_eq!(updated.stock, 7);
	}
}
