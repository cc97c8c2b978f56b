//! Event bus: best-effort, at-most-once, in-order-per-publisher
//! delivery over a bounded ring buffer. `tokio::sync::broadcast` already
//! implements the bounded-capacity-with-drop-oldest-for-lagging-receivers
//! behavior the component calls for; a lagging subscriber surfaces that as
//! `RecvError::Lagged(n)`, which [`EventSubscriber::recv`] folds into a
//! running drop counter instead of propagating it as an error.

use crate::event::Event;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

pub struct EventBus {
	tx: broadcast::Sender<Event>,
}

impl EventBus {
	#[must_use]
	pub fn new(capacity: usize) -> Self {
		let (tx, _rx) = broadcast::channel(capacity);
		Self { tx }
	}

	pub fn publish(&self, event: Event) {
		// No receivers is not an error: a bus with nothing subscribed yet
		// (or anymore) simply drops the event, per best-effort delivery.
		let _ = self.tx.send(event);
	}

	#[must_use]
	pub fn subscribe(&self) -> EventSubscriber {
		EventSubscriber {
			rx: self.tx.subscribe(),
			dropped: Arc::new(AtomicU64::new(0)),
		}
	}

	#[must_use]
	pub fn subscriber_count(&self) -> usize {
		self.tx.receiver_count()
	}
}

pub struct EventSubscriber {
	rx: broadcast::Receiver<Event>,
	dropped: Arc<AtomicU64>,
}

impl EventSubscriber {
	/// Waits for the next event, transparently skipping past any gap left
	/// by a lag and recording how many events were lost to it.
	pub async fn recv(&mut self) -> Option<Event> {
		loop {
			match self.rx.recv().await {
				Ok(event) => return Some(event),
				Err(broadcast::error::RecvError::Lagged(skipped)) => {
					self.dropped.fetch_add(skipped, Ordering::Relaxed);
					warn!(skipped, "event subscriber lagged, oldest events dropped");
				}
				Err(broadcast::error::RecvError::Closed) => return None,
			}
		}
	}

	#[must_use]
	pub fn dropped_count(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}
}
