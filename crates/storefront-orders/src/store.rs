//! Client-side order store.
//!
//! The authoritative in-process snapshot of all orders, together with the
//! loading flag and the last store-level error. Two independent write
//! sources feed it: the live subscription replaces the item list
//! wholesale, and the mutation coordinator applies targeted optimistic
//! patches. The snapshot always wins — an optimistic patch survives only
//! until the next snapshot arrives, which reconciles local state to the
//! remote truth. Readers always see a complete, consistent list; there is
//! no torn state.

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use storefront_types::{Order, OrderStatus};

/// Owned state container for the order dashboard.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct OrderStore {
	/// Current item list. Replaced wholesale by snapshots, patched by the
	/// coordinator.
	items: ArcSwap<Vec<Order>>,
	/// True until the first snapshot or fetch completes.
	loading: AtomicBool,
	/// Last subscription or mutation error. Cleared by a manual refresh.
	error: ArcSwapOption<String>,
}

impl OrderStore {
	/// Creates an empty store in the loading state.
	pub fn new() -> Self {
		Self {
			items: ArcSwap::from_pointee(Vec::new()),
			loading: AtomicBool::new(true),
			error: ArcSwapOption::empty(),
		}
	}

	/// Returns the current item list.
	pub fn snapshot(&self) -> Arc<Vec<Order>> {
		self.items.load_full()
	}

	/// Returns true while the store waits for its first data.
	pub fn is_loading(&self) -> bool {
		self.loading.load(Ordering::Acquire)
	}

	/// Sets the loading flag.
	pub fn set_loading(&self, loading: bool) {
		self.loading.store(loading, Ordering::Release);
	}

	/// Returns the last recorded error, if any.
	pub fn error(&self) -> Option<String> {
		self.error.load_full().map(|message| (*message).clone())
	}

	/// Records an error and clears the loading flag.
	pub fn record_error(&self, message: impl Into<String>) {
		self.error.store(Some(Arc::new(message.into())));
		self.set_loading(false);
	}

	/// Clears the recorded error.
	pub fn clear_error(&self) {
		self.error.store(None);
	}

	/// Replaces the item list wholesale and clears the loading flag.
	///
	/// This is the snapshot path; it overwrites any optimistic local
	/// patches applied since the previous snapshot.
	pub fn replace_all(&self, orders: Vec<Order>) {
		self.items.store(Arc::new(orders));
		self.set_loading(false);
	}

	/// Applies an optimistic local status change.
	///
	/// Finds the order by id, sets its status and appends one history
	/// entry. A missing id is a silent no-op: the order disappeared from
	/// the local list (filtered out or deleted remotely), which is not an
	/// error.
	pub fn apply_local_status_change(
		&self,
		order_id: &str,
		new_status: OrderStatus,
		changed_at: DateTime<Utc>,
	) {
		self.items.rcu(|items| {
			match items.iter().position(|order| order.id == order_id) {
				Some(index) => {
					let mut next = (**items).clone();
					next[index].record_status(new_status, changed_at);
					Arc::new(next)
				}
				None => Arc::clone(items),
			}
		});
	}
}

impl Default for OrderStore {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_types::StatusChange;

	fn order(id: &str, status: OrderStatus) -> Order {
		let t = Utc::now();
		Order {
			id: id.to_string(),
			order_number: Some(123456),
			user_id: "u1".into(),
			full_name: "Sam Doe".into(),
			phone: "+20 100 000 0000".into(),
			address: "1 Market St".into(),
			items: Vec::new(),
			total: Default::default(),
			status,
			status_history: vec![StatusChange {
				status,
				changed_at: t,
			}],
			created_at: Some(t),
			updated_at: Some(t),
		}
	}

	#[test]
	fn new_store_is_loading_and_empty() {
		let store = OrderStore::new();
		assert!(store.is_loading());
		assert!(store.snapshot().is_empty());
		assert_eq!(store.error(), None);
	}

	#[test]
	fn replace_all_clears_loading() {
		let store = OrderStore::new();
		store.replace_all(vec![order("o1", OrderStatus::Pending)]);
		assert!(!store.is_loading());
		assert_eq!(store.snapshot().len(), 1);
	}

	#[test]
	fn local_status_change_updates_status_and_history() {
		let store = OrderStore::new();
		store.replace_all(vec![order("o1", OrderStatus::Pending)]);

		let t = Utc::now();
		store.apply_local_status_change("o1", OrderStatus::Processing, t);

		let snapshot = store.snapshot();
		let updated = &snapshot[0];
		assert_eq!(updated.status, OrderStatus::Processing);
		assert_eq!(updated.status_history.len(), 2);
		let last = updated.status_history.last().unwrap();
		assert_eq!(last.status, OrderStatus::Processing);
		assert_eq!(last.changed_at, t);
	}

	#[test]
	fn local_status_change_on_unknown_id_is_a_silent_noop() {
		let store = OrderStore::new();
		store.replace_all(vec![order("o1", OrderStatus::Pending)]);
		let before = store.snapshot();

		store.apply_local_status_change("missing", OrderStatus::Processing, Utc::now());

		let after = store.snapshot();
		assert_eq!(*before, *after);
		assert_eq!(store.error(), None);
	}

	#[test]
	fn snapshot_wins_over_optimistic_change() {
		let store = OrderStore::new();
		store.replace_all(vec![order("o1", OrderStatus::Pending)]);
		store.apply_local_status_change("o1", OrderStatus::Processing, Utc::now());

		// The next snapshot reflects the remote truth, which never saw the
		// optimistic change.
		store.replace_all(vec![order("o1", OrderStatus::Pending)]);
		assert_eq!(store.snapshot()[0].status, OrderStatus::Pending);
		assert_eq!(store.snapshot()[0].status_history.len(), 1);
	}

	#[test]
	fn record_error_clears_loading() {
		let store = OrderStore::new();
		store.record_error("subscription failed");
		assert!(!store.is_loading());
		assert_eq!(store.error().as_deref(), Some("subscription failed"));
		store.clear_error();
		assert_eq!(store.error(), None);
	}
}
