//! HTTP document-store backend for the storefront service.
//!
//! This module provides a reqwest-based client against a remote document
//! API. The remote service owns persistence and consistency; this backend
//! only issues requests. Live subscriptions are emulated by polling the
//! query at a configured interval and delivering a full snapshot whenever
//! the result set changes, with explicit start/stop semantics.

use crate::{
	DocumentStoreInterface, SnapshotEvent, StorageError, StoreFactory, StoreRegistry, Subscription,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use storefront_types::{
	Collection, ConfigSchema, Document, DocumentPatch, DocumentQuery, Field, FieldType,
	ImplementationRegistry, Schema, SortDirection, ValidationError,
};
use tokio::sync::mpsc;

/// Default polling interval for emulated live subscriptions, in seconds.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Default request timeout, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP document-store implementation.
pub struct HttpStore {
	/// Shared HTTP client with connection pooling.
	client: reqwest::Client,
	/// Base URL of the remote document API, without a trailing slash.
	base_url: String,
	/// Polling interval for `watch`, in seconds.
	poll_interval_secs: u64,
}

/// Response body of a document insert.
#[derive(Debug, Deserialize)]
struct InsertResponse {
	id: String,
}

impl HttpStore {
	/// Creates an HttpStore against the given base URL.
	pub fn new(
		base_url: impl Into<String>,
		poll_interval_secs: u64,
		timeout_secs: u64,
	) -> Result<Self, StorageError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(timeout_secs))
			.build()
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		let mut base_url = base_url.into();
		while base_url.ends_with('/') {
			base_url.pop();
		}
		Ok(Self {
			client,
			base_url,
			poll_interval_secs,
		})
	}

	fn collection_url(&self, collection: Collection) -> String {
		format!("{}/collections/{}", self.base_url, collection.as_str())
	}

	fn document_url(&self, collection: Collection, id: &str) -> String {
		format!("{}/{}", self.collection_url(collection), id)
	}
}

fn direction_param(direction: SortDirection) -> &'static str {
	match direction {
		SortDirection::Ascending => "asc",
		SortDirection::Descending => "desc",
	}
}

/// Maps a response to a storage error, turning 404 into NotFound.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
	if response.status() == reqwest::StatusCode::NOT_FOUND {
		return Err(StorageError::NotFound);
	}
	if !response.status().is_success() {
		return Err(StorageError::Backend(format!(
			"Remote API returned {}",
			response.status()
		)));
	}
	Ok(response)
}

async fn fetch_snapshot(
	client: &reqwest::Client,
	url: &str,
	query: &DocumentQuery,
) -> Result<Vec<Document>, StorageError> {
	let mut params = vec![
		("order_by".to_string(), query.order_by.clone()),
		("direction".to_string(), direction_param(query.direction).to_string()),
	];
	if let Some(filter) = &query.filter {
		params.push(("where".to_string(), filter.field.clone()));
		params.push(("equals".to_string(), filter.value.to_string()));
	}
	let response = client
		.get(url)
		.query(&params)
		.send()
		.await
		.map_err(|e| StorageError::Backend(e.to_string()))?;
	check_status(response)
		.await?
		.json::<Vec<Document>>()
		.await
		.map_err(|e| StorageError::Serialization(e.to_string()))
}

#[async_trait]
impl DocumentStoreInterface for HttpStore {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpStoreSchema)
	}

	async fn get_all(&self, query: &DocumentQuery) -> Result<Vec<Document>, StorageError> {
		fetch_snapshot(&self.client, &self.collection_url(query.collection), query).await
	}

	async fn get(&self, collection: Collection, id: &str) -> Result<Document, StorageError> {
		let response = self
			.client
			.get(self.document_url(collection, id))
			.send()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		check_status(response)
			.await?
			.json::<Document>()
			.await
			.map_err(|e| StorageError::Serialization(e.to_string()))
	}

	async fn insert(
		&self,
		collection: Collection,
		id: Option<&str>,
		data: serde_json::Value,
	) -> Result<String, StorageError> {
		let body = serde_json::json!({ "id": id, "data": data });
		let response = self
			.client
			.post(self.collection_url(collection))
			.json(&body)
			.send()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		let inserted: InsertResponse = check_status(response)
			.await?
			.json()
			.await
			.map_err(|e| StorageError::Serialization(e.to_string()))?;
		Ok(inserted.id)
	}

	async fn apply_patch(
		&self,
		collection: Collection,
		id: &str,
		patch: &DocumentPatch,
	) -> Result<(), StorageError> {
		// The server-timestamp sentinel travels by field name; the remote
		// API resolves it with its own clock.
		let response = self
			.client
			.patch(self.document_url(collection, id))
			.json(patch)
			.send()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		check_status(response).await.map(|_| ())
	}

	async fn delete(&self, collection: Collection, id: &str) -> Result<(), StorageError> {
		let response = self
			.client
			.delete(self.document_url(collection, id))
			.send()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		// Deleting an absent document is not an error.
		match check_status(response).await {
			Ok(_) | Err(StorageError::NotFound) => Ok(()),
			Err(e) => Err(e),
		}
	}

	async fn watch(&self, query: &DocumentQuery) -> Result<Subscription, StorageError> {
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let (stop_tx, mut stop_rx) = mpsc::channel(1);
		let client = self.client.clone();
		let url = self.collection_url(query.collection);
		let query = query.clone();
		let poll_interval = Duration::from_secs(self.poll_interval_secs);

		tokio::spawn(async move {
			let mut interval = tokio::time::interval(poll_interval);
			// Skip missed ticks instead of bursting after a stall.
			interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
			let mut last: Option<Vec<Document>> = None;
			loop {
				tokio::select! {
					_ = interval.tick() => {
						match fetch_snapshot(&client, &url, &query).await {
							Ok(snapshot) => {
								if last.as_ref() == Some(&snapshot) {
									continue;
								}
								last = Some(snapshot.clone());
								if event_tx.send(SnapshotEvent::Snapshot(snapshot)).is_err() {
									break;
								}
							}
							Err(e) => {
								// No automatic retry; the subscription ends
								// and manual refresh is the recovery path.
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

/// Configuration schema for HttpStore.
pub struct HttpStoreSchema;

impl ConfigSchema for HttpStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![Field::new("base_url", FieldType::String).with_validator(|value| {
				let url = value.as_str().unwrap_or_default();
				if url.starts_with("http://") || url.starts_with("https://") {
					Ok(())
				} else {
					Err("base_url must start with http:// or https://".to_string())
				}
			})],
			vec![
				Field::new(
					"poll_interval_secs",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
				Field::new(
					"timeout_secs",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
		)
		.validate(config)
	}
}

/// Registry for the HTTP document-store implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl StoreRegistry for Registry {}

/// Factory function to create an HTTP document store from configuration.
///
/// Configuration parameters:
/// - `base_url`: base URL of the remote document API
/// - `poll_interval_secs`: polling interval for subscriptions (defaults to 3)
/// - `timeout_secs`: request timeout (defaults to 30)
pub fn create_store(config: &toml::Value) -> Result<Box<dyn DocumentStoreInterface>, StorageError> {
	HttpStoreSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	let base_url = config
		.get("base_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StorageError::Configuration("Missing 'base_url'".into()))?;
	let poll_interval_secs = config
		.get("poll_interval_secs")
		.and_then(|v| v.as_integer())
		.map(|n| n as u64)
		.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
	let timeout_secs = config
		.get("timeout_secs")
		.and_then(|v| v.as_integer())
		.map(|n| n as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECS);
	let store = HttpStore::new(base_url, poll_interval_secs, timeout_secs)?;
	Ok(Box::new(store))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn factory_rejects_non_http_base_url() {
		let config: toml::Value = toml::from_str("base_url = \"ftp://docs\"").unwrap();
		assert!(matches!(
			create_store(&config),
			Err(StorageError::Configuration(_))
		));
	}

	#[test]
	fn factory_accepts_minimal_config() {
		let config: toml::Value = toml::from_str("base_url = \"http://localhost:8090\"").unwrap();
		assert!(create_store(&config).is_ok());
	}

	#[test]
	fn trailing_slashes_are_trimmed_from_base_url() {
		let store = HttpStore::new("http://localhost:8090///", 3, 30).unwrap();
		assert_eq!(
			store.collection_url(Collection::Orders),
			"http://localhost:8090/collections/orders"
		);
	}
}
