//! Document-store module for the storefront system.
//!
//! This module provides the abstraction over the external document store
//! the storefront is a client of: collection queries, one-shot reads,
//! partial updates with array appends and server-timestamp sentinels, and
//! live snapshot subscriptions. Different backend implementations are
//! supported: in-memory, file-based, and a remote HTTP document API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use storefront_types::{
	Collection, Document, DocumentPatch, DocumentQuery, ImplementationRegistry, SortDirection,
};
use thiserror::Error;
use tokio::sync::mpsc;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod http;
	pub mod memory;
}

/// Errors that can occur during document-store operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested document is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// One delivery from a live subscription.
///
/// A subscription pushes full result-set snapshots, never diffs; each
/// snapshot reflects the remote state at a point in time.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
	/// A fresh full snapshot of the query's result set.
	Snapshot(Vec<Document>),
	/// The subscription failed and will deliver nothing further.
	Lost(String),
}

/// A live subscription to a collection query.
///
/// Deliveries arrive through [`Subscription::recv`]; calling
/// [`Subscription::stop`] (or dropping the value) unsubscribes, after
/// which no further snapshots are delivered. There is no torn state: a
/// stopped subscription simply stops sending.
pub struct Subscription {
	receiver: mpsc::UnboundedReceiver<SnapshotEvent>,
	stop: Option<mpsc::Sender<()>>,
}

impl Subscription {
	/// Creates a subscription from its delivery channel and stop signal.
	///
	/// Backends hand the sending halves to their watch task.
	pub fn new(receiver: mpsc::UnboundedReceiver<SnapshotEvent>, stop: mpsc::Sender<()>) -> Self {
		Self {
			receiver,
			stop: Some(stop),
		}
	}

	/// Receives the next snapshot event, or `None` once the subscription
	/// has ended.
	pub async fn recv(&mut self) -> Option<SnapshotEvent> {
		self.receiver.recv().await
	}

	/// Stops the subscription. Further snapshots are never delivered.
	pub async fn stop(mut self) {
		if let Some(stop) = self.stop.take() {
			let _ = stop.send(()).await;
		}
		self.receiver.close();
	}
}

/// Trait defining the interface for document-store backends.
///
/// This trait must be implemented by any backend that wants to act as the
/// storefront's document store. It mirrors the external collaborator's
/// contract: ordered collection reads, document CRUD, partial patches and
/// live snapshot subscriptions.
#[async_trait]
pub trait DocumentStoreInterface: Send + Sync {
	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn storefront_types::ConfigSchema>;

	/// Reads the full result set of an ordered collection query.
	async fn get_all(&self, query: &DocumentQuery) -> Result<Vec<Document>, StorageError>;

	/// Reads a single document by id.
	async fn get(&self, collection: Collection, id: &str) -> Result<Document, StorageError>;

	/// Inserts a document, overwriting any document with the same id.
	///
	/// When `id` is `None` the backend assigns one and returns it.
	async fn insert(
		&self,
		collection: Collection,
		id: Option<&str>,
		data: serde_json::Value,
	) -> Result<String, StorageError>;

	/// Applies a partial update to an existing document.
	///
	/// Server-timestamp sentinel fields are resolved by the backend's own
	/// clock at apply time. Fails with [`StorageError::NotFound`] when the
	/// document does not exist.
	async fn apply_patch(
		&self,
		collection: Collection,
		id: &str,
		patch: &DocumentPatch,
	) -> Result<(), StorageError>;

	/// Deletes a document. Deleting an absent document is not an error.
	async fn delete(&self, collection: Collection, id: &str) -> Result<(), StorageError>;

	/// Opens a live subscription delivering full snapshots of the query.
	async fn watch(&self, query: &DocumentQuery) -> Result<Subscription, StorageError>;
}

/// Type alias for document-store factory functions.
///
/// This is the function signature that all storage implementations must
/// provide to create instances of their backend.
pub type StoreFactory = fn(&toml::Value) -> Result<Box<dyn DocumentStoreInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StoreRegistry: ImplementationRegistry<Factory = StoreFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available backends.
/// This is used by the builder to register every implementation without
/// the service naming them one by one.
pub fn get_all_implementations() -> Vec<(&'static str, StoreFactory)> {
	use implementations::{file, http, memory};

	vec![
		(memory::Registry::NAME, memory::Registry::factory()),
		(file::Registry::NAME, file::Registry::factory()),
		(http::Registry::NAME, http::Registry::factory()),
	]
}

/// High-level document-store service that provides typed operations.
///
/// The StoreService wraps a backend and decodes documents into typed
/// records at the boundary, applying each type's default-substitution
/// rules. Documents that fail to decode are skipped with a warning rather
/// than failing the whole read; a malformed remote document must not take
/// the storefront down.
pub struct StoreService {
	/// The underlying document-store backend.
	backend: Box<dyn DocumentStoreInterface>,
}

impl StoreService {
	/// Creates a new StoreService with the specified backend.
	pub fn new(backend: Box<dyn DocumentStoreInterface>) -> Self {
		Self { backend }
	}

	/// Reads and decodes the full result set of an ordered query.
	pub async fn fetch_all<T: DeserializeOwned>(
		&self,
		query: &DocumentQuery,
	) -> Result<Vec<T>, StorageError> {
		let documents = self.backend.get_all(query).await?;
		Ok(decode_documents(query.collection, documents))
	}

	/// Reads and decodes a single document.
	pub async fn fetch<T: DeserializeOwned>(
		&self,
		collection: Collection,
		id: &str,
	) -> Result<T, StorageError> {
		let document = self.backend.get(collection, id).await?;
		document
			.decode()
			.map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Encodes and inserts a typed value, returning the document id.
	pub async fn create<T: Serialize>(
		&self,
		collection: Collection,
		id: Option<&str>,
		value: &T,
	) -> Result<String, StorageError> {
		let data =
			serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.insert(collection, id, data).await
	}

	/// Applies a partial update to an existing document.
	pub async fn patch(
		&self,
		collection: Collection,
		id: &str,
		patch: &DocumentPatch,
	) -> Result<(), StorageError> {
		self.backend.apply_patch(collection, id, patch).await
	}

	/// Deletes a document.
	pub async fn remove(&self, collection: Collection, id: &str) -> Result<(), StorageError> {
		self.backend.delete(collection, id).await
	}

	/// Opens a live subscription on the backend.
	pub async fn watch(&self, query: &DocumentQuery) -> Result<Subscription, StorageError> {
		self.backend.watch(query).await
	}
}

/// Decodes a batch of documents, skipping the ones that fail.
///
/// Used by [`StoreService::fetch_all`] and by live-feed consumers that
/// receive raw snapshots.
pub fn decode_documents<T: DeserializeOwned>(
	collection: Collection,
	documents: Vec<Document>,
) -> Vec<T> {
	documents
		.into_iter()
		.filter_map(|document| match document.decode() {
			Ok(value) => Some(value),
			Err(e) => {
				tracing::warn!(
					collection = %collection,
					error = %e,
					"Skipping undecodable document"
				);
				None
			}
		})
		.collect()
}

/// Retains only the documents matching a query's equality filter.
pub(crate) fn filter_documents(documents: &mut Vec<Document>, query: &DocumentQuery) {
	if let Some(filter) = &query.filter {
		documents.retain(|document| document.data.get(&filter.field) == Some(&filter.value));
	}
}

/// Sorts documents in place by a body field.
///
/// Strings compare lexicographically (RFC 3339 timestamps order correctly
/// this way), numbers numerically; a missing or non-comparable field sorts
/// as the oldest/smallest value.
pub(crate) fn sort_documents(documents: &mut [Document], field: &str, direction: SortDirection) {
	documents.sort_by(|a, b| {
		let ordering = compare_field(a.data.get(field), b.data.get(field));
		match direction {
			SortDirection::Ascending => ordering,
			SortDirection::Descending => ordering.reverse(),
		}
	});
}

fn compare_field(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> std::cmp::Ordering {
	use std::cmp::Ordering;
	match (rank(a), rank(b)) {
		(FieldRank::Missing, FieldRank::Missing) => Ordering::Equal,
		(FieldRank::Missing, _) => Ordering::Less,
		(_, FieldRank::Missing) => Ordering::Greater,
		(FieldRank::Number(x), FieldRank::Number(y)) => {
			x.partial_cmp(&y).unwrap_or(Ordering::Equal)
		}
		(FieldRank::Text(x), FieldRank::Text(y)) => x.cmp(&y),
		// Numbers before strings, for lack of a better cross-type order.
		(FieldRank::Number(_), FieldRank::Text(_)) => Ordering::Less,
		(FieldRank::Text(_), FieldRank::Number(_)) => Ordering::Greater,
	}
}

enum FieldRank {
	Missing,
	Number(f64),
	Text(String),
}

fn rank(value: Option<&serde_json::Value>) -> FieldRank {
	match value {
		Some(serde_json::Value::Number(n)) => {
			n.as_f64().map(FieldRank::Number).unwrap_or(FieldRank::Missing)
		}
		Some(serde_json::Value::String(s)) => FieldRank::Text(s.clone()),
		_ => FieldRank::Missing,
	}
}

/// Applies a patch to a document body in place.
///
/// Shared by the local backends; the HTTP backend ships the patch to the
/// remote API instead. `now` resolves the server-timestamp sentinels.
pub(crate) fn apply_patch_value(
	data: &mut serde_json::Value,
	patch: &DocumentPatch,
	now: chrono::DateTime<chrono::Utc>,
) {
	if let Some(map) = data.as_object_mut() {
		for (field, value) in &patch.sets {
			map.insert(field.clone(), value.clone());
		}
		for (field, value) in &patch.appends {
			match map.get_mut(field).and_then(|v| v.as_array_mut()) {
				Some(array) => array.push(value.clone()),
				None => {
					map.insert(field.clone(), serde_json::Value::Array(vec![value.clone()]));
				}
			}
		}
		for field in &patch.server_timestamps {
			map.insert(
				field.clone(),
				serde_json::Value::String(now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
			);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use storefront_types::DocumentPatch;

	#[test]
	fn sort_places_missing_fields_oldest() {
		let mut docs = vec![
			Document::new("b", json!({ "createdAt": "2024-03-02T00:00:00Z" })),
			Document::new("missing", json!({})),
			Document::new("a", json!({ "createdAt": "2024-03-01T00:00:00Z" })),
		];
		sort_documents(&mut docs, "createdAt", SortDirection::Ascending);
		let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
		assert_eq!(ids, vec!["missing", "a", "b"]);

		sort_documents(&mut docs, "createdAt", SortDirection::Descending);
		let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
		assert_eq!(ids, vec!["b", "a", "missing"]);
	}

	#[test]
	fn patch_appends_create_missing_arrays() {
		let mut data = json!({ "status": "Pending" });
		let patch = DocumentPatch::new()
			.set("status", &"Processing")
			.unwrap()
			.append("statusHistory", &json!({ "status": "Processing" }))
			.unwrap()
			.touch("updatedAt");
		apply_patch_value(&mut data, &patch, chrono::Utc::now());
		assert_eq!(data["status"], json!("Processing"));
		assert_eq!(data["statusHistory"].as_array().unwrap().len(), 1);
		assert!(data["updatedAt"].is_string());
	}
}
