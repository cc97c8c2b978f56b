//! KV position cache (`position:{queueId}:{userIdentifier}`): a short-TTL
//! read-through cache in front of the controller's `PositionOf` query.
//! Correctness hinges on one invariant: any waiting-set mutation for a queue
//! evicts every cached entry for that queue, rather than attempting to
//! recompute the shifted position of every other waiting session.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use waitroom_core::ids::QueueId;

pub struct PositionCache {
	entries: DashMap<(QueueId, String), (usize, Instant)>,
	ttl: Duration,
}

impl PositionCache {
	#[must_use]
	pub fn new(ttl: Duration) -> Self {
		Self { entries: DashMap::new(), ttl }
	}

	#[must_use]
	pub fn get(&self, queue_id: QueueId, user_identifier: &str) -> Option<usize> {
		let key = (queue_id, user_identifier.to_string());
		let entry = self.entries.get(&key)?;
		let (position, stored_at) = *entry;
		if stored_at.elapsed() >= self.ttl {
			drop(entry);
			self.entries.remove(&key);
			return None;
		}
		Some(position)
	}

	pub fn set(&self, queue_id: QueueId, user_identifier: &str, position: usize) {
		self.entries.insert((queue_id, user_identifier.to_string()), (position, Instant::now()));
	}

	/// Drops every cached entry belonging to `queue_id`. Called after any
	/// enqueue, drop, release, or reprioritization against that queue.
	pub fn invalidate_queue(&self, queue_id: QueueId) {
		self.entries.retain(|(q, _), _| *q != queue_id);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expired_entries_are_treated_as_absent() {
		let cache = PositionCache::new(Duration::from_millis(5));
		let queue_id = QueueId::new();
		cache.set(queue_id, "alice", 3);
		assert_eq!(cache.get(queue_id, "alice"), Some(3));
		std::thread::sleep(Duration::from_millis(10));
		assert_eq!(cache.get(queue_id, "alice"), None);
	}

	#[test]
	fn invalidate_queue_drops_only_that_queues_entries() {
		let cache = PositionCache::new(Duration::from_secs(60));
		let a = QueueId::new();
		let b = QueueId::new();
		cache.set(a, "alice", 1);
		cache.set(b, "bob", 2);
		cache.invalidate_queue(a);
		assert_eq!(cache.get(a, "alice"), None);
		assert_eq!(cache.get(b, "bob"), Some(2));
	}
}
