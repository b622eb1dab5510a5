//! Order types for the storefront system.
//!
//! This module defines the typed order record and its lifecycle states.
//! Orders are created once at checkout, read many times through the live
//! order feed, and mutated only by status transitions; every other field
//! is a snapshot frozen at creation time.

use crate::document::lenient_datetime;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of a placed order.
///
/// The states form a fixed linear sequence; legal transitions move exactly
/// one step forward or backward along it. A document without a status
/// decodes to `Pending`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
	/// Order has been placed and awaits handling.
	#[default]
	Pending,
	/// Order is being prepared.
	Processing,
	/// Order has left the warehouse.
	Shipped,
	/// Order has reached the customer.
	Delivered,
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderStatus::Pending => write!(f, "Pending"),
			OrderStatus::Processing => write!(f, "Processing"),
			OrderStatus::Shipped => write!(f, "Shipped"),
			OrderStatus::Delivered => write!(f, "Delivered"),
		}
	}
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
	type Err = UnknownStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pending" => Ok(Self::Pending),
			"processing" => Ok(Self::Processing),
			"shipped" => Ok(Self::Shipped),
			"delivered" => Ok(Self::Delivered),
			_ => Err(UnknownStatus(s.to_string())),
		}
	}
}

/// One entry of an order's append-only status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
	/// Status the order moved to.
	pub status: OrderStatus,
	/// When the change was applied.
	pub changed_at: DateTime<Utc>,
}

/// One line item of an order, snapshotted from the cart at checkout.
///
/// Catalog changes after checkout never affect placed orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
	/// Product the line was created from.
	#[serde(default)]
	pub product_id: String,
	/// Product name at checkout time.
	#[serde(default)]
	pub name: String,
	/// Product description at checkout time.
	#[serde(default)]
	pub desc: String,
	/// Unit price at checkout time. Non-negative.
	#[serde(default)]
	pub price: Decimal,
	/// Quantity ordered. Positive.
	#[serde(default = "default_quantity")]
	pub quantity: u32,
	/// Image reference carried over from the cart entry.
	#[serde(default)]
	pub image: Option<String>,
}

fn default_quantity() -> u32 {
	1
}

impl LineItem {
	/// Price times quantity for this line.
	pub fn line_total(&self) -> Decimal {
		self.price * Decimal::from(self.quantity)
	}
}

/// A placed purchase.
///
/// Decoding from a raw document applies the boundary defaults: a missing
/// `status` becomes [`OrderStatus::Pending`], missing or unparseable
/// timestamps become `None`, and a missing history decodes empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Opaque identifier assigned by the document store. Immutable.
	pub id: String,
	/// Display-only 6-digit number assigned at creation. Randomly
	/// generated, not guaranteed unique, never used for identification.
	#[serde(default)]
	pub order_number: Option<u32>,
	/// Owning account identifier. Immutable.
	#[serde(default)]
	pub user_id: String,
	/// Shipping snapshot captured at checkout. Immutable.
	#[serde(default)]
	pub full_name: String,
	/// Shipping snapshot captured at checkout. Immutable.
	#[serde(default)]
	pub phone: String,
	/// Shipping snapshot captured at checkout. Immutable.
	#[serde(default)]
	pub address: String,
	/// Line items snapshotted from the cart. Immutable.
	#[serde(default)]
	pub items: Vec<LineItem>,
	/// Sum of price x quantity over items, computed once at checkout.
	#[serde(default)]
	pub total: Decimal,
	/// Current lifecycle state. Mutated only through status transitions.
	#[serde(default)]
	pub status: OrderStatus,
	/// Append-only record of every status change. The first entry is
	/// `{Pending, created_at}`; the last entry always matches `status`.
	#[serde(default)]
	pub status_history: Vec<StatusChange>,
	/// Creation timestamp. Immutable.
	#[serde(default, deserialize_with = "lenient_datetime")]
	pub created_at: Option<DateTime<Utc>>,
	/// Last-modified timestamp, bumped on every mutation.
	#[serde(default, deserialize_with = "lenient_datetime")]
	pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
	/// Applies a status change, keeping `status` and the history in sync.
	///
	/// This is the only sanctioned way to move an order's status: it sets
	/// the field and appends exactly one history entry, preserving the
	/// invariant that `status` equals the last history entry.
	pub fn record_status(&mut self, status: OrderStatus, changed_at: DateTime<Utc>) {
		self.status = status;
		self.status_history.push(StatusChange { status, changed_at });
	}
}

/// Per-status order counts for the dashboard filter, plus an `All` total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
	/// Total order count.
	pub all: usize,
	/// Orders currently `Pending`.
	pub pending: usize,
	/// Orders currently `Processing`.
	pub processing: usize,
	/// Orders currently `Shipped`.
	pub shipped: usize,
	/// Orders currently `Delivered`.
	pub delivered: usize,
}

impl StatusCounts {
	/// Counts one order with the given status.
	pub fn record(&mut self, status: OrderStatus) {
		self.all += 1;
		match status {
			OrderStatus::Pending => self.pending += 1,
			OrderStatus::Processing => self.processing += 1,
			OrderStatus::Shipped => self.shipped += 1,
			OrderStatus::Delivered => self.delivered += 1,
		}
	}

	/// Returns the count for one status.
	pub fn get(&self, status: OrderStatus) -> usize {
		match status {
			OrderStatus::Pending => self.pending,
			OrderStatus::Processing => self.processing,
			OrderStatus::Shipped => self.shipped,
			OrderStatus::Delivered => self.delivered,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Document;
	use serde_json::json;

	#[test]
	fn missing_status_decodes_to_pending() {
		let doc = Document::new("o1", json!({ "userId": "u1" }));
		let order: Order = doc.decode().unwrap();
		assert_eq!(order.status, OrderStatus::Pending);
		assert!(order.status_history.is_empty());
	}

	#[test]
	fn record_status_appends_exactly_one_entry() {
		let doc = Document::new(
			"o1",
			json!({
				"status": "Pending",
				"statusHistory": [{ "status": "Pending", "changedAt": "2024-03-01T10:00:00Z" }],
			}),
		);
		let mut order: Order = doc.decode().unwrap();
		let t = Utc::now();
		order.record_status(OrderStatus::Processing, t);
		assert_eq!(order.status, OrderStatus::Processing);
		assert_eq!(order.status_history.len(), 2);
		let last = order.status_history.last().unwrap();
		assert_eq!(last.status, OrderStatus::Processing);
		assert_eq!(last.changed_at, t);
	}

	#[test]
	fn status_parses_case_insensitively() {
		assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
		assert_eq!("Pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
		assert!("unknown".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn line_total_multiplies_price_by_quantity() {
		let item = LineItem {
			product_id: "p1".into(),
			name: "Chair".into(),
			desc: String::new(),
			price: Decimal::new(1250, 2),
			quantity: 3,
			image: None,
		};
		assert_eq!(item.line_total(), Decimal::new(3750, 2));
	}
}
