//! Pure filter/search/sort derivations over the order store.
//!
//! Recomputed on every call from the store's current snapshot; the
//! underlying data is never mutated and a fresh list is returned each
//! time.

use storefront_types::{Order, OrderStatus, SortDirection, StatusCounts};

/// Status filter for the dashboard list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
	/// Every order regardless of status.
	#[default]
	All,
	/// Only orders currently in the given status.
	Only(OrderStatus),
}

/// One derived view over the order list: status filter, free-text search
/// and creation-time ordering.
#[derive(Debug, Clone)]
pub struct OrderView {
	/// Status subset to show.
	pub filter: StatusFilter,
	/// Case-insensitive substring matched against id, full name and
	/// status. Blank or absent means no search.
	pub search: Option<String>,
	/// Creation-time sort direction.
	pub sort: SortDirection,
}

impl Default for OrderView {
	/// Everything, unsearched, newest first — the dashboard's initial view.
	fn default() -> Self {
		Self {
			filter: StatusFilter::All,
			search: None,
			sort: SortDirection::Descending,
		}
	}
}

impl OrderView {
	/// Derives the displayed list from the given orders.
	///
	/// Selection first (status, then search), then a stable sort by
	/// `created_at`; orders with a missing or unparseable creation time
	/// sort as the oldest possible value.
	pub fn apply(&self, orders: &[Order]) -> Vec<Order> {
		let needle = self
			.search
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_lowercase);

		let mut selected: Vec<Order> = orders
			.iter()
			.filter(|order| self.matches_status(order))
			.filter(|order| match &needle {
				Some(needle) => matches_search(order, needle),
				None => true,
			})
			.cloned()
			.collect();

		selected.sort_by(|a, b| {
			let ordering = sort_key(a).cmp(&sort_key(b));
			match self.sort {
				SortDirection::Ascending => ordering,
				SortDirection::Descending => ordering.reverse(),
			}
		});
		selected
	}

	fn matches_status(&self, order: &Order) -> bool {
		match self.filter {
			StatusFilter::All => true,
			StatusFilter::Only(status) => order.status == status,
		}
	}
}

fn matches_search(order: &Order, needle: &str) -> bool {
	order.id.to_lowercase().contains(needle)
		|| order.full_name.to_lowercase().contains(needle)
		|| order.status.to_string().to_lowercase().contains(needle)
}

fn sort_key(order: &Order) -> i64 {
	order
		.created_at
		.map(|t| t.timestamp_millis())
		.unwrap_or(i64::MIN)
}

/// Per-status counts over the unfiltered list, plus the `All` total.
pub fn status_counts(orders: &[Order]) -> StatusCounts {
	let mut counts = StatusCounts::default();
	for order in orders {
		counts.record(order.status);
	}
	counts
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{DateTime, Utc};

	fn order(id: &str, name: &str, status: OrderStatus, created_at: Option<&str>) -> Order {
		Order {
			id: id.to_string(),
			order_number: None,
			user_id: "u1".into(),
			full_name: name.to_string(),
			phone: String::new(),
			address: String::new(),
			items: Vec::new(),
			total: Default::default(),
			status,
			status_history: Vec::new(),
			created_at: created_at.map(|s| {
				DateTime::parse_from_rfc3339(s)
					.unwrap()
					.with_timezone(&Utc)
			}),
			updated_at: None,
		}
	}

	fn sample() -> Vec<Order> {
		vec![
			order("o1", "Amira Hassan", OrderStatus::Pending, Some("2024-03-01T08:00:00Z")),
			order("o2", "Omar Said", OrderStatus::Shipped, Some("2024-03-03T08:00:00Z")),
			order("o3", "Laila Nour", OrderStatus::Pending, Some("2024-03-02T08:00:00Z")),
			order("o4", "Nadia Fahmy", OrderStatus::Delivered, None),
		]
	}

	#[test]
	fn filtering_by_status_returns_exactly_that_subset() {
		let orders = sample();
		let view = OrderView {
			filter: StatusFilter::Only(OrderStatus::Pending),
			search: None,
			sort: SortDirection::Ascending,
		};
		let shown = view.apply(&orders);
		assert_eq!(shown.len(), 2);
		assert!(shown.iter().all(|o| o.status == OrderStatus::Pending));
	}

	#[test]
	fn filtering_by_all_preserves_the_full_set() {
		let orders = sample();
		let view = OrderView::default();
		assert_eq!(view.apply(&orders).len(), orders.len());
	}

	#[test]
	fn search_matches_id_name_and_status() {
		let orders = sample();
		let by_id = OrderView {
			search: Some("o2".into()),
			..Default::default()
		};
		assert_eq!(by_id.apply(&orders).len(), 1);

		let by_name = OrderView {
			search: Some("laila".into()),
			..Default::default()
		};
		assert_eq!(by_name.apply(&orders)[0].id, "o3");

		let by_status = OrderView {
			search: Some("delivered".into()),
			..Default::default()
		};
		assert_eq!(by_status.apply(&orders)[0].id, "o4");

		let blank = OrderView {
			search: Some("   ".into()),
			..Default::default()
		};
		assert_eq!(blank.apply(&orders).len(), orders.len());
	}

	#[test]
	fn sort_reverses_between_directions() {
		let orders = sample();
		let descending = OrderView::default().apply(&orders);
		let ascending = OrderView {
			sort: SortDirection::Ascending,
			..Default::default()
		}
		.apply(&orders);

		let down: Vec<_> = descending.iter().map(|o| o.id.as_str()).collect();
		let mut up: Vec<_> = ascending.iter().map(|o| o.id.as_str()).collect();
		up.reverse();
		assert_eq!(down, up);

		// Missing created_at sorts oldest: last when descending.
		assert_eq!(down.last(), Some(&"o4"));
	}

	#[test]
	fn counts_cover_every_status_and_the_total() {
		let counts = status_counts(&sample());
		assert_eq!(counts.all, 4);
		assert_eq!(counts.pending, 2);
		assert_eq!(counts.processing, 0);
		assert_eq!(counts.shipped, 1);
		assert_eq!(counts.delivered, 1);
	}
}
