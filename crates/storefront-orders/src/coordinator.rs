//! Order mutation coordinator.
//!
//! Performs status transitions with optimistic-then-confirmed semantics:
//! the local store is patched first for immediate feedback, then one
//! remote patch persists the change. A remote failure is recorded in the
//! store's error slot and the optimistic change is left in place — the
//! next live snapshot reconciles local state to the remote truth, which
//! may silently revert it. Concurrent transitions against the same order
//! are not serialized here; the document store applies last-write-wins.

use crate::flow;
use crate::store::OrderStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use storefront_storage::StoreService;
use storefront_types::{Collection, DocumentPatch, Order, OrderStatus, StatusChange};

/// Result of a `move_next`/`move_prev` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
	/// The transition was applied locally and a remote patch was issued.
	Applied {
		status: OrderStatus,
		changed_at: DateTime<Utc>,
	},
	/// No legal transition exists in the requested direction; nothing
	/// happened, locally or remotely.
	NoOp,
}

/// Coordinates optimistic status changes between the local store and the
/// remote document store.
pub struct StatusCoordinator {
	store: Arc<OrderStore>,
	storage: Arc<StoreService>,
}

impl StatusCoordinator {
	/// Creates a coordinator over the given store and document store.
	pub fn new(store: Arc<OrderStore>, storage: Arc<StoreService>) -> Self {
		Self { store, storage }
	}

	/// Returns the order store this coordinator writes to.
	pub fn store(&self) -> &Arc<OrderStore> {
		&self.store
	}

	/// Applies a status change optimistically, then persists it.
	///
	/// The remote patch sets the status, appends one history entry and
	/// bumps `updatedAt` with the server-timestamp sentinel. On remote
	/// failure the error lands in the store and the optimistic change
	/// stays; rollback is left to the next snapshot.
	pub async fn change_status(&self, order_id: &str, new_status: OrderStatus) -> DateTime<Utc> {
		let changed_at = Utc::now();
		self.store
			.apply_local_status_change(order_id, new_status, changed_at);

		let entry = StatusChange {
			status: new_status,
			changed_at,
		};
		let patch = DocumentPatch::new()
			.set("status", &new_status)
			.and_then(|patch| patch.append("statusHistory", &entry))
			.map(|patch| patch.touch("updatedAt"));

		match patch {
			Ok(patch) => {
				if let Err(e) = self.storage.patch(Collection::Orders, order_id, &patch).await {
					tracing::warn!(order_id, error = %e, "Failed to persist status change");
					self.store
						.record_error(format!("Failed to update status: {}", e));
				}
			}
			Err(e) => {
				self.store
					.record_error(format!("Failed to encode status change: {}", e));
			}
		}
		changed_at
	}

	/// Moves an order one step forward along the status flow.
	///
	/// Returns [`TransitionOutcome::NoOp`] without touching anything when
	/// the order is already `Delivered`.
	pub async fn move_next(&self, order: &Order) -> TransitionOutcome {
		match flow::next_status(order.status) {
			Some(next) => TransitionOutcome::Applied {
				status: next,
				changed_at: self.change_status(&order.id, next).await,
			},
			None => TransitionOutcome::NoOp,
		}
	}

	/// Moves an order one step backward along the status flow.
	///
	/// Returns [`TransitionOutcome::NoOp`] without touching anything when
	/// the order is still `Pending`.
	pub async fn move_prev(&self, order: &Order) -> TransitionOutcome {
		match flow::prev_status(order.status) {
			Some(previous) => TransitionOutcome::Applied {
				status: previous,
				changed_at: self.change_status(&order.id, previous).await,
			},
			None => TransitionOutcome::NoOp,
		}
	}

	/// One-shot fallback fetch, used for manual refresh.
	///
	/// Replaces the item list on success and records the error on failure;
	/// failures never escape this boundary.
	pub async fn refresh(&self) {
		self.store.set_loading(true);
		self.store.clear_error();
		match self
			.storage
			.fetch_all::<Order>(&crate::orders_feed_query())
			.await
		{
			Ok(orders) => self.store.replace_all(orders),
			Err(e) => {
				tracing::warn!(error = %e, "Manual order refresh failed");
				self.store
					.record_error(format!("Failed to fetch orders: {}", e));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use storefront_storage::implementations::memory::MemoryStore;

	const T0: &str = "2024-03-01T10:00:00Z";

	async fn seeded() -> (Arc<OrderStore>, Arc<StoreService>, StatusCoordinator) {
		let storage = Arc::new(StoreService::new(Box::new(MemoryStore::new())));
		storage
			.create(
				Collection::Orders,
				Some("o1"),
				&json!({
					"status": "Pending",
					"statusHistory": [{ "status": "Pending", "changedAt": T0 }],
					"createdAt": T0,
				}),
			)
			.await
			.unwrap();

		let store = Arc::new(OrderStore::new());
		let coordinator = StatusCoordinator::new(store.clone(), storage.clone());
		coordinator.refresh().await;
		(store, storage, coordinator)
	}

	fn first(store: &OrderStore) -> Order {
		store.snapshot().first().cloned().unwrap()
	}

	#[tokio::test]
	async fn move_next_applies_locally_and_persists_remotely() {
		let (store, storage, coordinator) = seeded().await;
		let order = first(&store);

		let outcome = coordinator.move_next(&order).await;
		let changed_at = match outcome {
			TransitionOutcome::Applied { status, changed_at } => {
				assert_eq!(status, OrderStatus::Processing);
				changed_at
			}
			TransitionOutcome::NoOp => panic!("expected a transition"),
		};

		// Immediate local state.
		let local = first(&store);
		assert_eq!(local.status, OrderStatus::Processing);
		assert_eq!(local.status_history.len(), 2);
		assert_eq!(local.status_history[1].status, OrderStatus::Processing);
		assert_eq!(local.status_history[1].changed_at, changed_at);
		assert_eq!(store.error(), None);

		// One remote patch with the same status and history append.
		let remote: Order = storage.fetch(Collection::Orders, "o1").await.unwrap();
		assert_eq!(remote.status, OrderStatus::Processing);
		assert_eq!(remote.status_history.len(), 2);
		assert!(remote.updated_at.is_some());
	}

	#[tokio::test]
	async fn remote_failure_keeps_optimistic_state_and_records_error() {
		let (store, _storage, coordinator) = seeded().await;

		// Locally visible order that the remote store never saw: the patch
		// fails with NotFound.
		let mut stray = first(&store);
		stray.id = "ghost".to_string();
		let mut orders = (*store.snapshot()).clone();
		orders.push(stray.clone());
		store.replace_all(orders);

		let outcome = coordinator.move_next(&stray).await;
		assert!(matches!(outcome, TransitionOutcome::Applied { .. }));

		// The optimistic change is still there, not rolled back.
		let local = store
			.snapshot()
			.iter()
			.find(|o| o.id == "ghost")
			.cloned()
			.unwrap();
		assert_eq!(local.status, OrderStatus::Processing);
		assert_eq!(local.status_history.len(), 2);
		assert!(store.error().is_some());
	}

	#[tokio::test]
	async fn move_next_on_delivered_is_a_noop_with_zero_remote_calls() {
		let (store, storage, coordinator) = seeded().await;
		coordinator
			.change_status("o1", OrderStatus::Delivered)
			.await;
		let delivered = first(&store);
		assert_eq!(delivered.status, OrderStatus::Delivered);
		let remote_before: Order = storage.fetch(Collection::Orders, "o1").await.unwrap();

		let outcome = coordinator.move_next(&delivered).await;
		assert_eq!(outcome, TransitionOutcome::NoOp);

		// Nothing changed locally or remotely.
		assert_eq!(first(&store).status_history.len(), delivered.status_history.len());
		let remote_after: Order = storage.fetch(Collection::Orders, "o1").await.unwrap();
		assert_eq!(remote_before, remote_after);
	}

	#[tokio::test]
	async fn move_prev_on_pending_is_a_noop() {
		let (store, _storage, coordinator) = seeded().await;
		let order = first(&store);
		assert_eq!(coordinator.move_prev(&order).await, TransitionOutcome::NoOp);
		assert_eq!(first(&store).status, OrderStatus::Pending);
	}

	#[tokio::test]
	async fn refresh_recovers_from_an_error_state() {
		let (store, _storage, coordinator) = seeded().await;
		store.record_error("subscription failed");
		coordinator.refresh().await;
		assert_eq!(store.error(), None);
		assert!(!store.is_loading());
		assert_eq!(store.snapshot().len(), 1);
	}
}
