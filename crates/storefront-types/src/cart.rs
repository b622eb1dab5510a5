//! Cart entry types for the shopping cart collection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry in a user's shopping cart.
///
/// Cart entries carry a denormalized snapshot of the product (name, price,
/// image) so the cart renders without a catalog lookup; checkout turns them
/// into order line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
	/// Identifier assigned by the document store.
	pub id: String,
	/// Owning user.
	#[serde(default)]
	pub user_id: String,
	/// Product the entry refers to.
	#[serde(default)]
	pub product_id: String,
	/// Product name at the time the entry was added.
	#[serde(default)]
	pub name: String,
	/// Unit price at the time the entry was added.
	#[serde(default)]
	pub price: Decimal,
	/// Units in the cart.
	#[serde(default = "default_quantity")]
	pub quantity: u32,
	/// Whether the entry is selected for checkout.
	#[serde(default = "default_checked")]
	pub checked: bool,
	/// Image reference carried over from the product.
	#[serde(default)]
	pub image: Option<String>,
}

fn default_quantity() -> u32 {
	1
}

fn default_checked() -> bool {
	true
}

impl CartEntry {
	/// Price times quantity for this entry.
	pub fn line_total(&self) -> Decimal {
		self.price * Decimal::from(self.quantity)
	}
}
