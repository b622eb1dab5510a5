//! Per-user favorite product lists.
//!
//! One document per user in the `favorites` collection holds the whole
//! product-id list; toggling rewrites the list. An absent document reads
//! as an empty list.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_storage::{StorageError, StoreService};
use storefront_types::Collection;

/// The favorites document body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FavoritesDoc {
	#[serde(default)]
	items: Vec<String>,
}

/// Service managing per-user favorites.
pub struct FavoritesService {
	storage: Arc<StoreService>,
}

impl FavoritesService {
	/// Creates a favorites service over the given document store.
	pub fn new(storage: Arc<StoreService>) -> Self {
		Self { storage }
	}

	/// Returns the user's favorite product ids.
	pub async fn list(&self, user_id: &str) -> Result<Vec<String>, StorageError> {
		match self
			.storage
			.fetch::<FavoritesDoc>(Collection::Favorites, user_id)
			.await
		{
			Ok(doc) => Ok(doc.items),
			Err(StorageError::NotFound) => Ok(Vec::new()),
			Err(e) => Err(e),
		}
	}

	/// Toggles one product in the user's favorites.
	///
	/// Adds the product when absent, removes it when present, and returns
	/// the new list.
	pub async fn toggle(
		&self,
		user_id: &str,
		product_id: &str,
	) -> Result<Vec<String>, StorageError> {
		let mut items = self.list(user_id).await?;
		match items.iter().position(|id| id == product_id) {
			Some(index) => {
				items.remove(index);
			}
			None => items.push(product_id.to_string()),
		}
		let doc = FavoritesDoc {
			items: items.clone(),
		};
		self.storage
			.create(Collection::Favorites, Some(user_id), &doc)
			.await?;
		Ok(items)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::implementations::memory::MemoryStore;

	fn service() -> FavoritesService {
		FavoritesService::new(Arc::new(StoreService::new(Box::new(MemoryStore::new()))))
	}

	#[tokio::test]
	async fn absent_document_reads_as_empty() {
		let favorites = service();
		assert!(favorites.list("u1").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn toggle_adds_then_removes() {
		let favorites = service();
		assert_eq!(favorites.toggle("u1", "p1").await.unwrap(), vec!["p1"]);
		assert_eq!(
			favorites.toggle("u1", "p2").await.unwrap(),
			vec!["p1", "p2"]
		);
		assert_eq!(favorites.toggle("u1", "p1").await.unwrap(), vec!["p2"]);
		assert_eq!(favorites.list("u1").await.unwrap(), vec!["p2"]);
	}
}
