//! In-memory document-store backend for the storefront service.
//!
//! This module provides a memory-based implementation of the
//! DocumentStoreInterface trait, useful for testing and development
//! scenarios where persistence is not required. Live subscriptions are
//! driven by an in-process change notifier.

use crate::{
	apply_patch_value, filter_documents, sort_documents, DocumentStoreInterface, SnapshotEvent,
	StorageError, StoreFactory, StoreRegistry, Subscription,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_types::{
	Collection, ConfigSchema, Document, DocumentPatch, DocumentQuery, ImplementationRegistry,
	Schema, ValidationError,
};
use tokio::sync::{broadcast, mpsc, RwLock};

/// Capacity of the change-notification channel.
///
/// A lagged watcher resynchronizes with a fresh snapshot, so the capacity
/// only bounds how often that happens under write bursts.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

type CollectionMap = HashMap<Collection, HashMap<String, serde_json::Value>>;

/// In-memory document-store implementation.
///
/// Documents live in per-collection maps behind a read-write lock. Every
/// mutation broadcasts the touched collection so open subscriptions can
/// deliver a fresh full snapshot, matching the collaborator's
/// snapshot-per-change contract.
pub struct MemoryStore {
	/// Per-collection document maps protected by a read-write lock.
	collections: Arc<RwLock<CollectionMap>>,
	/// Change notifier carrying the collection a mutation touched.
	changes: broadcast::Sender<Collection>,
}

impl MemoryStore {
	/// Creates a new MemoryStore instance.
	pub fn new() -> Self {
		let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
		Self {
			collections: Arc::new(RwLock::new(HashMap::new())),
			changes,
		}
	}

	fn notify(&self, collection: Collection) {
		// No receivers is fine; nobody is watching.
		let _ = self.changes.send(collection);
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

/// Reads the current full snapshot for a query.
async fn read_snapshot(
	collections: &Arc<RwLock<CollectionMap>>,
	query: &DocumentQuery,
) -> Vec<Document> {
	let guard = collections.read().await;
	let mut documents: Vec<Document> = guard
		.get(&query.collection)
		.map(|map| {
			map.iter()
				.map(|(id, data)| Document::new(id.clone(), data.clone()))
				.collect()
		})
		.unwrap_or_default();
	drop(guard);
	filter_documents(&mut documents, query);
	sort_documents(&mut documents, &query.order_by, query.direction);
	documents
}

#[async_trait]
impl DocumentStoreInterface for MemoryStore {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStoreSchema)
	}

	async fn get_all(&self, query: &DocumentQuery) -> Result<Vec<Document>, StorageError> {
		Ok(read_snapshot(&self.collections, query).await)
	}

	async fn get(&self, collection: Collection, id: &str) -> Result<Document, StorageError> {
		let guard = self.collections.read().await;
		guard
			.get(&collection)
			.and_then(|map| map.get(id))
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
			let mut guard = self.collections.write().await;
			guard.entry(collection).or_default().insert(id.clone(), data);
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
			let mut guard = self.collections.write().await;
			let data = guard
				.get_mut(&collection)
				.and_then(|map| map.get_mut(id))
				.ok_or(StorageError::NotFound)?;
			apply_patch_value(data, patch, chrono::Utc::now());
		}
		self.notify(collection);
		Ok(())
	}

	async fn delete(&self, collection: Collection, id: &str) -> Result<(), StorageError> {
		let removed = {
			let mut guard = self.collections.write().await;
			guard
				.get_mut(&collection)
				.and_then(|map| map.remove(id))
				.is_some()
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
		let collections = self.collections.clone();
		let query = query.clone();

		tokio::spawn(async move {
			let snapshot = read_snapshot(&collections, &query).await;
			if event_tx.send(SnapshotEvent::Snapshot(snapshot)).is_err() {
				return;
			}
			loop {
				tokio::select! {
					changed = changes.recv() => {
						match changed {
							Ok(collection) if collection == query.collection => {
								let snapshot = read_snapshot(&collections, &query).await;
								if event_tx.send(SnapshotEvent::Snapshot(snapshot)).is_err() {
									break;
								}
							}
							Ok(_) => {}
							Err(broadcast::error::RecvError::Lagged(_)) => {
								// Missed notifications collapse into one resync.
								let snapshot = read_snapshot(&collections, &query).await;
								if event_tx.send(SnapshotEvent::Snapshot(snapshot)).is_err() {
									break;
								}
							}
							Err(broadcast::error::RecvError::Closed) => break,
						}
					}
					_ = stop_rx.recv() => break,
				}
			}
		});

		Ok(Subscription::new(event_rx, stop_tx))
	}
}

/// Configuration schema for MemoryStore.
pub struct MemoryStoreSchema;

impl ConfigSchema for MemoryStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Registry for the memory document-store implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl StoreRegistry for Registry {}

/// Factory function to create a memory document store from configuration.
///
/// Configuration parameters: none required.
pub fn create_store(
	_config: &toml::Value,
) -> Result<Box<dyn DocumentStoreInterface>, StorageError> {
	Ok(Box::new(MemoryStore::new()))
}
