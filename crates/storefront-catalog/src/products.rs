//! Product catalog management and browsing.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_storage::{StorageError, StoreService};
use storefront_types::{
	Category, Collection, DocumentPatch, DocumentQuery, Product, SortDirection,
};
use thiserror::Error;
use validator::Validate;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// A product submission failed validation.
	#[error("Invalid product: {0}")]
	Invalid(#[from] validator::ValidationErrors),
	/// The requested product does not exist.
	#[error("Product not found: {0}")]
	NotFound(String),
	/// An update carried no fields to change.
	#[error("Update has no fields")]
	EmptyUpdate,
	/// The document store rejected a read or write.
	#[error("Storage error: {0}")]
	Storage(StorageError),
}

impl From<StorageError> for CatalogError {
	fn from(e: StorageError) -> Self {
		CatalogError::Storage(e)
	}
}

/// A validated product submission from the admin surface.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
	/// Display name, at least two characters.
	#[validate(length(min = 2, message = "Name is required"))]
	pub name: String,
	/// Description, at least five characters.
	#[validate(length(min = 5, message = "Description is required"))]
	pub description: String,
	/// Unit price, strictly positive.
	#[validate(custom(function = "validate_positive_price"))]
	pub price: Decimal,
	/// Initial stock.
	pub stock: u32,
	/// Category the product is browsed under.
	pub category: Category,
	/// Public URL of the uploaded product image.
	#[serde(default)]
	pub image_url: Option<String>,
	/// Blob-storage path of the image, kept for deletion.
	#[serde(default)]
	pub image_path: Option<String>,
}

fn validate_positive_price(price: &Decimal) -> Result<(), validator::ValidationError> {
	if *price > Decimal::ZERO {
		Ok(())
	} else {
		Err(validator::ValidationError::new("price_not_positive"))
	}
}

/// A partial product update from the admin surface.
///
/// Only the present fields change; `updated_at` is always bumped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
	pub name: Option<String>,
	pub description: Option<String>,
	pub price: Option<Decimal>,
	pub stock: Option<u32>,
	pub category: Option<Category>,
	pub image_url: Option<String>,
	pub image_path: Option<String>,
}

impl ProductUpdate {
	fn into_patch(self) -> Result<DocumentPatch, CatalogError> {
		let mut patch = DocumentPatch::new();
		let encode = |e: storefront_types::DocumentError| {
			CatalogError::Storage(StorageError::Serialization(e.to_string()))
		};
		if let Some(name) = &self.name {
			patch = patch.set("name", name).map_err(encode)?;
		}
		if let Some(description) = &self.description {
			patch = patch.set("description", description).map_err(encode)?;
		}
		if let Some(price) = &self.price {
			patch = patch.set("price", price).map_err(encode)?;
		}
		if let Some(stock) = &self.stock {
			patch = patch.set("stock", stock).map_err(encode)?;
		}
		if let Some(category) = &self.category {
			patch = patch.set("category", category).map_err(encode)?;
		}
		if let Some(image_url) = &self.image_url {
			patch = patch.set("imageUrl", image_url).map_err(encode)?;
		}
		if let Some(image_path) = &self.image_path {
			patch = patch.set("imagePath", image_path).map_err(encode)?;
		}
		if patch.is_empty() {
			return Err(CatalogError::EmptyUpdate);
		}
		Ok(patch.touch("updatedAt"))
	}
}

/// Pure browsing derivation over the product list: name search and
/// category filter, recomputed on every input change.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
	/// Case-insensitive substring matched against the product name.
	pub search: Option<String>,
	/// Category to restrict to.
	pub category: Option<Category>,
}

impl CatalogView {
	/// Derives the browsable subset from the given products.
	pub fn apply(&self, products: &[Product]) -> Vec<Product> {
		let needle = self
			.search
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_lowercase);
		products
			.iter()
			.filter(|product| match self.category {
				Some(category) => product.category == Some(category),
				None => true,
			})
			.filter(|product| match &needle {
				Some(needle) => product.name.to_lowercase().contains(needle),
				None => true,
			})
			.cloned()
			.collect()
	}
}

/// Service managing the product catalog.
pub struct ProductService {
	storage: Arc<StoreService>,
}

impl ProductService {
	/// Creates a product service over the given document store.
	pub fn new(storage: Arc<StoreService>) -> Self {
		Self { storage }
	}

	/// Lists the catalog, newest first.
	pub async fn list(&self) -> Result<Vec<Product>, CatalogError> {
		let query =
			DocumentQuery::ordered_by(Collection::Products, "createdAt", SortDirection::Descending);
		Ok(self.storage.fetch_all(&query).await?)
	}

	/// Reads one product.
	pub async fn get(&self, product_id: &str) -> Result<Product, CatalogError> {
		self.storage
			.fetch(Collection::Products, product_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => CatalogError::NotFound(product_id.to_string()),
				other => CatalogError::Storage(other),
			})
	}

	/// Validates and adds a product, returning it with its new id.
	pub async fn create(&self, submission: NewProduct) -> Result<Product, CatalogError> {
		submission.validate()?;
		let now = Utc::now();
		let product = Product {
			id: uuid::Uuid::new_v4().to_string(),
			name: submission.name.trim().to_string(),
			description: submission.description.trim().to_string(),
			price: submission.price,
			stock: submission.stock,
			category: Some(submission.category),
			image_url: submission.image_url,
			image_path: submission.image_path,
			created_at: Some(now),
			updated_at: Some(now),
		};
		self.storage
			.create(Collection::Products, Some(&product.id), &product)
			.await?;
		tracing::info!(product_id = %product.id, name = %product.name, "Product added");
		Ok(product)
	}

	/// Applies a partial update to a product.
	pub async fn update(&self, product_id: &str, update: ProductUpdate) -> Result<(), CatalogError> {
		let patch = update.into_patch()?;
		self.storage
			.patch(Collection::Products, product_id, &patch)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => CatalogError::NotFound(product_id.to_string()),
				other => CatalogError::Storage(other),
			})
	}

	/// Removes a product from the catalog.
	pub async fn delete(&self, product_id: &str) -> Result<(), CatalogError> {
		self.storage.remove(Collection::Products, product_id).await?;
		tracing::info!(product_id, "Product deleted");
		Ok(())
	}

	/// Adjusts a product's stock by a delta, clamping at zero.
	///
	/// Used by the cart when quantities change and by the order-placed
	/// handler when line items are committed.
	pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> Result<u32, CatalogError> {
		let product = self.get(product_id).await?;
		let new_stock = (product.stock as i64 + delta).max(0) as u32;
		let patch = DocumentPatch::new()
			.set("stock", &new_stock)
			.map_err(|e| CatalogError::Storage(StorageError::Serialization(e.to_string())))?
			.touch("updatedAt");
		self.storage
			.patch(Collection::Products, product_id, &patch)
			.await?;
		Ok(new_stock)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::implementations::memory::MemoryStore;

	fn service() -> ProductService {
		ProductService::new(Arc::new(StoreService::new(Box::new(MemoryStore::new()))))
	}

	fn chair() -> NewProduct {
		NewProduct {
			name: "Walnut chair".into(),
			description: "A solid walnut dining chair.".into(),
			price: Decimal::new(14999, 2),
			stock: 8,
			category: Category::Chairs,
			image_url: None,
			image_path: None,
		}
	}

	#[tokio::test]
	async fn create_then_get_round_trips() {
		let products = service();
		let created = products.create(chair()).await.unwrap();
		let fetched = products.get(&created.id).await.unwrap();
		assert_eq!(fetched.name, "Walnut chair");
		assert_eq!(fetched.category, Some(Category::Chairs));
		assert!(fetched.created_at.is_some());
	}

	#[tokio::test]
	async fn short_name_is_rejected() {
		let products = service();
		let bad = NewProduct {
			name: "X".into(),
			..chair()
		};
		assert!(matches!(
			products.create(bad).await,
			Err(CatalogError::Invalid(_))
		));
	}

	#[tokio::test]
	async fn non_positive_price_is_rejected() {
		let products = service();
		let bad = NewProduct {
			price: Decimal::ZERO,
			..chair()
		};
		assert!(matches!(
			products.create(bad).await,
			Err(CatalogError::Invalid(_))
		));
	}

	#[tokio::test]
	async fn update_changes_only_present_fields() {
		let products = service();
		let created = products.create(chair()).await.unwrap();
		products
			.update(
				&created.id,
				ProductUpdate {
					stock: Some(3),
					..Default::default()
				},
			)
			.await
			.unwrap();
		let fetched = products.get(&created.id).await.unwrap();
		assert_eq!(fetched.stock, 3);
		assert_eq!(fetched.name, created.name);
	}

	#[tokio::test]
	async fn empty_update_is_rejected() {
		let products = service();
		let created = products.create(chair()).await.unwrap();
		assert!(matches!(
			products.update(&created.id, ProductUpdate::default()).await,
			Err(CatalogError::EmptyUpdate)
		));
	}

	#[tokio::test]
	async fn stock_adjustment_clamps_at_zero() {
		let products = service();
		let created = products.create(chair()).await.unwrap();
		assert_eq!(products.adjust_stock(&created.id, -3).await.unwrap(), 5);
		assert_eq!(products.adjust_stock(&created.id, -100).await.unwrap(), 0);
		assert_eq!(products.adjust_stock(&created.id, 2).await.unwrap(), 2);
	}

	#[tokio::test]
	async fn browse_filters_by_category_and_name() {
		let products = service();
		products.create(chair()).await.unwrap();
		products
			.create(NewProduct {
				name: "Brass lamp".into(),
				description: "A warm brass reading lamp.".into(),
				category: Category::Lamps,
				..chair()
			})
			.await
			.unwrap();

		let all = products.list().await.unwrap();
		assert_eq!(all.len(), 2);

		let lamps = CatalogView {
			category: Some(Category::Lamps),
			..Default::default()
		}
		.apply(&all);
		assert_eq!(lamps.len(), 1);
		assert_eq!(lamps[0].name, "Brass lamp");

		let searched = CatalogView {
			search: Some("walnut".into()),
			..Default::default()
		}
		.apply(&all);
		assert_eq!(searched.len(), 1);
	}
}
