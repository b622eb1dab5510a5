//! Event bus for inter-service communication.
//!
//! A thin wrapper over a tokio broadcast channel. Publishers never block;
//! a slow subscriber that lags simply misses events, which is acceptable
//! because every event is observable state, not a command.

use storefront_types::StorefrontEvent;
use tokio::sync::broadcast;

/// Default capacity of the event channel.
const DEFAULT_CAPACITY: usize = 1000;

/// Broadcast bus carrying [`StorefrontEvent`]s between components.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<StorefrontEvent>,
}

impl EventBus {
	/// Creates an event bus with the given channel capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns the number of subscribers that received it; zero
	/// subscribers is not an error.
	pub fn publish(&self, event: StorefrontEvent) -> usize {
		self.sender.send(event).unwrap_or(0)
	}

	/// Opens a new subscription to the bus.
	pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}
