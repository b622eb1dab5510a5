//! File-based document-store backend for the storefront service.
//!
//! This module provides a local persistent implementation of the
//! DocumentStoreInterface trait. Each collection is stored as one JSON
//! file mapping document ids to bodies, written atomically via a
//! temp-file rename. Intended for development setups that should survive
//! a restart; the live subscription only observes writes made through
//! this process.

use crate::{
	apply_patch_value, filter_documents, sort_documents, DocumentStoreInterface, SnapshotEvent,
	StorageError, StoreFactory, StoreRegistry, Subscription,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storefront_types::{
	Collection, ConfigSchema, Document, DocumentPatch, DocumentQuery, Field, FieldType,
	ImplementationRegistry, Schema, ValidationError,
};
use tokio::sync::{broadcast, mpsc, RwLock};

/// Capacity of the change-notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// File-backed document-store implementation.
pub struct FileStore {
	/// Directory holding one `<collection>.json` per collection.
	root: PathBuf,
	/// Serializes file access within this process.
	guard: Arc<RwLock<()>>,
	/// Change notifier carrying the collection a mutation touched.
	changes: broadcast::Sender<Collection>,
}

impl FileStore {
	/// Creates a FileStore rooted at the given directory.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
		Self {
			root: root.into(),
			guard: Arc::new(RwLock::new(())),
			changes,
		}
	}

	fn collection_path(root: &Path, collection: Collection) -> PathBuf {
		root.join(format!("{}.json", collection.as_str()))
	}

	fn notify(&self, collection: Collection) {
		let _ = self.changes.send(collection);
	}
}

/// Loads a collection file, treating a missing file as an empty collection.
async fn load_collection(
	root: &Path,
	collection: Collection,
) -> Result<HashMap<String, serde_json::Value>, StorageError> {
	let path = FileStore::collection_path(root, collection);
	match tokio::fs::read(&path).await {
		Ok(bytes) => {
			serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
		}
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
		Err(e) => Err(StorageError::Backend(e.to_string())),
	}
}

/// Writes a collection file atomically (temp file + rename).
async fn store_collection(
	root: &Path,
	collection: Collection,
	map: &HashMap<String, serde_json::Value>,
) -> Result<(), StorageError> {
	let path = FileStore::collection_path(root, collection);
	let tmp = path.with_extension("json.tmp");
	let bytes =
		serde_json::to_vec_pretty(map).map_err(|e| StorageError::Serialization(e.to_string()))?;
	tokio::fs::write(&tmp, bytes)
		.await
		.map_err(|e| StorageError::Backend(e.to_string()))?;
	tokio::fs::rename(&tmp, &path)
		.await
		.map_err(|e| StorageError::Backend(e.to_string()))
}

/// Reads the current full snapshot for a query from disk.
async fn read_snapshot(
	root: &Path,
	guard: &Arc<RwLock<()>>,
	query: &DocumentQuery,
) -> Result<Vec<Document>, StorageError> {
	let _lock = guard.read().await;
	let map = load_collection(root, query.collection).await?;
	let mut documents: Vec<Document> = map
		.into_iter()
		.map(|(id, data)| Document::new(id, data))
		.collect();
	filter_documents(&mut documents, query);
	sort_documents(&mut documents, &query.order_by, query.direction);
	Ok(documents)
}

#[async_trait]
impl DocumentStoreInterface for FileStore {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStoreSchema)
	}

	async fn get_all(&self, query: &DocumentQuery) -> Result<Vec<Document>, StorageError> {
		read_snapshot(&self.root, &self.guard, query).await
	}

	async fn get(&self, collection: Collection, id: &str) -> Result<Document, StorageError> {
		let _lock = self.guard.read().await;
		let map = load_collection(&self.root, collection).await?;
		map.get(id)
			.map(|data| Document::new(id, data.clone()))
			.ok_or(StorageError::NotFound)
	}

	async fn insert(
		&self,
		collection: Collection,
		id: Option<&str>,
		data: serde_json::Value,
	) -> Result<String, StorageError> {
		if !data.is_object() {
			return Err(StorageError::Serialization(
				"Document body must be a JSON object".into(),
			));
		}
		let id = id
			.map(str::to_string)
			.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
		{
			let _lock = self.guard.write().await;
			let mut map = load_collection(&self.root, collection).await?;
			map.insert(id.clone(), data);
			store_collection(&self.root, collection, &map).await?;
		}
		self.notify(collection);
		Ok(id)
	}

	async fn apply_patch(
		&self,
		collection: Collection,
		id: &str,
		patch: &DocumentPatch,
	) -> Result<(), StorageError> {
		{
			let _lock = self.guard.write().await;
			let mut map = load_collection(&self.root, collection).await?;
			let data = map.get_mut(id).ok_or(StorageError::NotFound)?;
			apply_patch_value(data, patch, chrono::Utc::now());
			store_collection(&self.root, collection, &map).await?;
		}
		self.notify(collection);
		Ok(())
	}

	async fn delete(&self, collection: Collection, id: &str) -> Result<(), StorageError> {
		let removed = {
			let _lock = self.guard.write().await;
			let mut map = load_collection(&self.root, collection).await?;
			let removed = map.remove(id).is_some();
			if removed {
				store_collection(&self.root, collection, &map).await?;
			}
			removed
		};
		if removed {
			self.notify(collection);
		}
		Ok(())
	}

	async fn watch(&self, query: &DocumentQuery) -> Result<Subscription, StorageError> {
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let (stop_tx, mut stop_rx) = mpsc::channel(1);
		let mut changes = self.changes.subscribe();
		let root = self.root.clone();
		let guard = self.guard.clone();
		let query = query.clone();

		tokio::spawn(async move {
			match read_snapshot(&root, &guard, &query).await {
				Ok(snapshot) => {
					if event_tx.send(SnapshotEvent::Snapshot(snapshot)).is_err() {
						return;
					}
				}
				Err(e) => {
					let _ = event_tx.send(SnapshotEvent::Lost(e.to_string()));
					return;
				}
			}
			loop {
				tokio::select! {
					changed = changes.recv() => {
						let relevant = match changed {
							Ok(collection) => collection == query.collection,
							Err(broadcast::error::RecvError::Lagged(_)) => true,
							Err(broadcast::error::RecvError::Closed) => break,
						};
						if !relevant {
							continue;
						}
						match read_snapshot(&root, &guard, &query).await {
							Ok(snapshot) => {
								if event_tx.send(SnapshotEvent::Snapshot(snapshot)).is_err() {
									break;
								}
							}
							Err(e) => {
								let _ = event_tx.send(SnapshotEvent::Lost(e.to_string()));
								break;
							}
						}
					}
					_ = stop_rx.recv() => break,
				}
			}
		});

		Ok(Subscription::new(event_rx, stop_tx))
	}
}

/// Configuration schema for FileStore.
pub struct FileStoreSchema;

impl ConfigSchema for FileStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![Field::new("path", FieldType::String)], vec![]).validate(config)
	}
}

/// Registry for the file document-store implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl StoreRegistry for Registry {}

/// Factory function to create a file document store from configuration.
///
/// Configuration parameters:
/// - `path`: directory holding the collection files (created if absent)
pub fn create_store(config: &toml::Value) -> Result<Box<dyn DocumentStoreInterface>, StorageError> {
	FileStoreSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StorageError::Configuration("Missing 'path'".into()))?;
	std::fs::create_dir_all(path).map_err(|e| StorageError::Backend(e.to_string()))?;
	Ok(Box::new(FileStore::new(path)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use storefront_types::SortDirection;

	#[tokio::test]
	async fn documents_survive_a_new_store_instance() {
		let dir = tempfile::tempdir().unwrap();
		let id = {
			let store = FileStore::new(dir.path());
			store
				.insert(Collection::Products, None, json!({ "name": "Chair" }))
				.await
				.unwrap()
		};

		let reopened = FileStore::new(dir.path());
		let document = reopened.get(Collection::Products, &id).await.unwrap();
		assert_eq!(document.data["name"], json!("Chair"));
	}

	#[tokio::test]
	async fn patch_round_trips_through_disk() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path());
		let id = store
			.insert(Collection::Orders, Some("o1"), json!({ "status": "Pending" }))
			.await
			.unwrap();

		let patch = DocumentPatch::new()
			.set("status", &"Processing")
			.unwrap()
			.append("statusHistory", &json!({ "status": "Processing" }))
			.unwrap();
		store.apply_patch(Collection::Orders, &id, &patch).await.unwrap();

		let document = store.get(Collection::Orders, &id).await.unwrap();
		assert_eq!(document.data["status"], json!("Processing"));
		assert_eq!(document.data["statusHistory"].as_array().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn missing_collection_file_reads_as_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path());
		let query =
			DocumentQuery::ordered_by(Collection::Cart, "createdAt", SortDirection::Descending);
		assert!(store.get_all(&query).await.unwrap().is_empty());
	}
}
