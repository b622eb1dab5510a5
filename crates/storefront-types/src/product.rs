//! Product catalog types.

use crate::document::lenient_datetime;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Product categories offered by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Chairs,
	Cupboards,
	Tables,
	Lamps,
}

impl Category {
	/// Returns the string representation of the category.
	pub fn as_str(&self) -> &'static str {
		match self {
			Category::Chairs => "chairs",
			Category::Cupboards => "cupboards",
			Category::Tables => "tables",
			Category::Lamps => "lamps",
		}
	}

	/// Returns an iterator over all Category variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Chairs, Self::Cupboards, Self::Tables, Self::Lamps].into_iter()
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Error)]
#[error("Unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
	type Err = UnknownCategory;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"chairs" => Ok(Self::Chairs),
			"cupboards" => Ok(Self::Cupboards),
			"tables" => Ok(Self::Tables),
			"lamps" => Ok(Self::Lamps),
			_ => Err(UnknownCategory(s.to_string())),
		}
	}
}

/// One catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
	/// Identifier assigned at creation.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Longer description shown on the details page.
	#[serde(default)]
	pub description: String,
	/// Unit price. Non-negative.
	#[serde(default)]
	pub price: Decimal,
	/// Units currently in stock.
	#[serde(default)]
	pub stock: u32,
	/// Category the product is browsed under. Absent on legacy documents.
	#[serde(default)]
	pub category: Option<Category>,
	/// Public URL of the product image in blob storage.
	#[serde(default)]
	pub image_url: Option<String>,
	/// Blob-storage path of the image, kept for deletion.
	#[serde(default)]
	pub image_path: Option<String>,
	/// Creation timestamp.
	#[serde(default, deserialize_with = "lenient_datetime")]
	pub created_at: Option<DateTime<Utc>>,
	/// Last-modified timestamp.
	#[serde(default, deserialize_with = "lenient_datetime")]
	pub updated_at: Option<DateTime<Utc>>,
}
