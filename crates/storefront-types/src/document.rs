//! Raw document, query and patch types for the document-store boundary.
//!
//! External data enters the typed domain model exclusively through these
//! types: a [`Document`] is the untyped unit the store hands back, and
//! [`Document::decode`] is where default substitution happens (missing
//! `status` becomes `Pending`, a missing or unparseable timestamp becomes
//! `None`). Writes travel the other way through [`DocumentPatch`], which
//! carries plain field sets, array appends and server-timestamp sentinels.

use crate::Collection;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while encoding or decoding documents.
#[derive(Debug, Error)]
pub enum DocumentError {
	/// Error that occurs when a document cannot be decoded into a typed value.
	#[error("Failed to decode document '{id}': {message}")]
	Decode { id: String, message: String },
	/// Error that occurs when a typed value cannot be encoded as a document.
	#[error("Failed to encode value: {0}")]
	Encode(String),
	/// Error that occurs when a document body is not a JSON object.
	#[error("Document '{0}' is not a JSON object")]
	NotAnObject(String),
}

/// One untyped document as returned by the document store.
///
/// The collaborator assigns the `id`; the body is an arbitrary JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
	/// Collaborator-assigned document identifier.
	pub id: String,
	/// Raw JSON body of the document.
	pub data: serde_json::Value,
}

impl Document {
	/// Creates a document from an id and a raw JSON body.
	pub fn new(id: impl Into<String>, data: serde_json::Value) -> Self {
		Self {
			id: id.into(),
			data,
		}
	}

	/// Encodes a typed value as a document body.
	///
	/// The value must serialize to a JSON object. Any `id` field inside the
	/// serialized body is overwritten with the document id so the two can
	/// never disagree.
	pub fn encode<T: Serialize>(id: impl Into<String>, value: &T) -> Result<Self, DocumentError> {
		let id = id.into();
		let mut data =
			serde_json::to_value(value).map_err(|e| DocumentError::Encode(e.to_string()))?;
		match data.as_object_mut() {
			Some(map) => {
				map.insert("id".to_string(), serde_json::Value::String(id.clone()));
			}
			None => return Err(DocumentError::NotAnObject(id)),
		}
		Ok(Self { id, data })
	}

	/// Decodes the document into a typed value.
	///
	/// The document id is injected into the body under `id` before
	/// deserialization, mirroring the `{ id, ...data }` shape the original
	/// collaborator exposes; the store-assigned id is authoritative over
	/// any `id` field the body may carry. Field defaults declared on the
	/// target type are applied here, making this the single place where
	/// untyped external data is normalized.
	pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DocumentError> {
		let mut data = self.data.clone();
		match data.as_object_mut() {
			Some(map) => {
				map.insert(
					"id".to_string(),
					serde_json::Value::String(self.id.clone()),
				);
			}
			None => return Err(DocumentError::NotAnObject(self.id.clone())),
		}
		serde_json::from_value(data).map_err(|e| DocumentError::Decode {
			id: self.id.clone(),
			message: e.to_string(),
		})
	}
}

/// Sort direction for ordered queries and derived views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	/// Oldest (or smallest) first.
	Ascending,
	/// Newest (or largest) first.
	Descending,
}

impl SortDirection {
	/// Returns the opposite direction.
	pub fn toggled(&self) -> Self {
		match self {
			SortDirection::Ascending => SortDirection::Descending,
			SortDirection::Descending => SortDirection::Ascending,
		}
	}
}

/// An equality filter on one body field, like the collaborator's
/// `where(field, ==, value)` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
	/// Field the filter applies to.
	pub field: String,
	/// Value the field must equal.
	pub value: serde_json::Value,
}

/// A query against one collection with a single order-by clause and an
/// optional equality filter.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
	/// Collection to read.
	pub collection: Collection,
	/// Field the backend orders results by.
	pub order_by: String,
	/// Direction of the ordering.
	pub direction: SortDirection,
	/// Optional equality filter applied before ordering.
	pub filter: Option<FieldFilter>,
}

impl DocumentQuery {
	/// Creates a query over a collection ordered by the given field.
	pub fn ordered_by(
		collection: Collection,
		field: impl Into<String>,
		direction: SortDirection,
	) -> Self {
		Self {
			collection,
			order_by: field.into(),
			direction,
			filter: None,
		}
	}

	/// Restricts the query to documents whose field equals the value.
	pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.filter = Some(FieldFilter {
			field: field.into(),
			value: value.into(),
		});
		self
	}
}

/// A partial update applied to one document.
///
/// Mirrors the collaborator's update contract: plain field sets, array
/// appends (`arrayUnion`) and server-timestamp sentinel fields that the
/// backend resolves to its own clock when the patch is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
	/// Fields set to the given values.
	#[serde(default)]
	pub sets: BTreeMap<String, serde_json::Value>,
	/// Fields whose array value gets the given element appended.
	#[serde(default)]
	pub appends: BTreeMap<String, serde_json::Value>,
	/// Fields the backend stamps with its current time.
	#[serde(default)]
	pub server_timestamps: Vec<String>,
}

impl DocumentPatch {
	/// Creates an empty patch.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true when the patch carries no operations.
	pub fn is_empty(&self) -> bool {
		self.sets.is_empty() && self.appends.is_empty() && self.server_timestamps.is_empty()
	}

	/// Sets a field to a serialized value.
	pub fn set<T: Serialize>(mut self, field: impl Into<String>, value: &T) -> Result<Self, DocumentError> {
		let value = serde_json::to_value(value).map_err(|e| DocumentError::Encode(e.to_string()))?;
		self.sets.insert(field.into(), value);
		Ok(self)
	}

	/// Appends a serialized element to an array field.
	///
	/// Backends create the array when the field is missing or not an array.
	pub fn append<T: Serialize>(
		mut self,
		field: impl Into<String>,
		value: &T,
	) -> Result<Self, DocumentError> {
		let value = serde_json::to_value(value).map_err(|e| DocumentError::Encode(e.to_string()))?;
		self.appends.insert(field.into(), value);
		Ok(self)
	}

	/// Marks a field for the backend's server-timestamp sentinel.
	pub fn touch(mut self, field: impl Into<String>) -> Self {
		self.server_timestamps.push(field.into());
		self
	}
}

/// Deserializes an optional timestamp leniently.
///
/// Missing fields, non-string values and unparseable strings all decode to
/// `None` instead of failing the whole document. Callers treat `None` as
/// the oldest possible value where an ordering is needed.
pub fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
	Ok(raw
		.as_ref()
		.and_then(|value| value.as_str())
		.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
		.map(|dt| dt.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[derive(Debug, Deserialize, Serialize, PartialEq)]
	struct Sample {
		id: String,
		#[serde(default)]
		name: String,
		#[serde(default, deserialize_with = "lenient_datetime")]
		created_at: Option<DateTime<Utc>>,
	}

	#[test]
	fn decode_injects_id_and_applies_defaults() {
		let doc = Document::new("d1", json!({ "created_at": "2024-03-01T10:00:00Z" }));
		let sample: Sample = doc.decode().unwrap();
		assert_eq!(sample.id, "d1");
		assert_eq!(sample.name, "");
		assert!(sample.created_at.is_some());
	}

	#[test]
	fn decode_treats_unparseable_timestamp_as_none() {
		let doc = Document::new("d2", json!({ "name": "x", "created_at": "not a date" }));
		let sample: Sample = doc.decode().unwrap();
		assert_eq!(sample.created_at, None);
	}

	#[test]
	fn decode_rejects_non_object_bodies() {
		let doc = Document::new("d3", json!([1, 2, 3]));
		let result: Result<Sample, _> = doc.decode();
		assert!(matches!(result, Err(DocumentError::NotAnObject(_))));
	}

	#[test]
	fn encode_overwrites_embedded_id() {
		let sample = Sample {
			id: "stale".into(),
			name: "chair".into(),
			created_at: None,
		};
		let doc = Document::encode("fresh", &sample).unwrap();
		assert_eq!(doc.id, "fresh");
		assert_eq!(doc.data["id"], json!("fresh"));
	}

	#[test]
	fn patch_collects_sets_appends_and_timestamps() {
		let patch = DocumentPatch::new()
			.set("status", &"Shipped")
			.unwrap()
			.append("statusHistory", &json!({ "status": "Shipped" }))
			.unwrap()
			.touch("updatedAt");
		assert_eq!(patch.sets.len(), 1);
		assert_eq!(patch.appends.len(), 1);
		assert_eq!(patch.server_timestamps, vec!["updatedAt".to_string()]);
		assert!(!patch.is_empty());
	}
}
