//! Waiting set: the ordered set of sessions queued for a single queue.
//! One `RwLock` per queue; no operation here ever touches a second queue's
//! lock. `Insert`/`Remove` are `O(log n)`; `Size` is `O(1)`. `PositionOf`
//! is `O(k)` in the target's rank `k`, since `BTreeSet` has no augmented
//! subtree-size index to answer a rank query without walking to it.

use crate::ids::SessionId;
use crate::model::WaitingEntry;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct WaitingSet {
	ordered: BTreeSet<WaitingEntry>,
	by_session: HashMap<SessionId, WaitingEntry>,
	by_user: HashMap<String, SessionId>,
}

impl WaitingSet {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts `entry`, replacing any prior entry for the same session.
	pub fn insert(&mut self, entry: WaitingEntry, user_identifier: &str) {
		if let Some(old) = self.by_session.remove(&entry.session_id) {
			self.ordered.remove(&old);
		}
		self.by_user.insert(user_identifier.to_string(), entry.session_id);
		self.by_session.insert(entry.session_id, entry.clone());
		self.ordered.insert(entry);
	}

	/// Returns up to `n` entries in waiting-set order without removing them.
	#[must_use]
	pub fn peek(&self, n: usize) -> Vec<WaitingEntry> {
		self.ordered.iter().take(n).cloned().collect()
	}

	/// Removes and returns the entry for `session_id`, if present.
	pub fn remove(&mut self, session_id: SessionId) -> Option<WaitingEntry> {
		let entry = self.by_session.remove(&session_id)?;
		self.ordered.remove(&entry);
		self.by_user.retain(|_, v| *v != session_id);
		Some(entry)
	}

	/// Re-ranks an already-waiting session under a new priority, preserving
	/// its user-identifier binding. Returns `false` if it is not waiting.
	pub fn update_priority(&mut self, session_id: SessionId, priority: crate::model::Priority) -> bool {
		let Some(mut entry) = self.by_session.remove(&session_id) else {
			return false;
		};
		self.ordered.remove(&entry);
		entry.priority = priority;
		self.by_session.insert(session_id, entry.clone());
		self.ordered.insert(entry);
		true
	}

	/// 0-based rank of `session_id` within the waiting-set order, or `None`
	/// if it is not currently waiting.
	#[must_use]
	pub fn position_of(&self, session_id: SessionId) -> Option<usize> {
		let target = self.by_session.get(&session_id)?.clone();
		Some(self.ordered.range(..target).count())
	}

	#[must_use]
	pub fn session_for_user(&self, user_identifier: &str) -> Option<SessionId> {
		self.by_user.get(user_identifier).copied()
	}

	#[must_use]
	pub fn size(&self) -> usize {
		self.ordered.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.ordered.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::Priority;
	use chrono::{Duration, Utc};

	fn entry(priority: Priority, offset_secs: i64) -> WaitingEntry {
		WaitingEntry {
			priority,
			enqueued_at: Utc::now() + Duration::seconds(offset_secs),
			session_id: SessionId::new(),
		}
	}

	#[test]
	fn peek_orders_by_priority_then_fifo() {
		let mut set = WaitingSet::new();
		let low = entry(Priority::Low, 0);
		let vip = entry(Priority::Vip, 1);
		let normal_early = entry(Priority::Normal, -10);
		let normal_late = entry(Priority::Normal, 0);

		set.insert(low.clone(), "u1");
		set.insert(vip.clone(), "u2");
		set.insert(normal_early.clone(), "u3");
		set.insert(normal_late.clone(), "u4");

		let order: Vec<_> = set.peek(4).into_iter().map(|e| e.session_id).collect();
		assert_eq!(order, vec![vip.session_id, normal_early.session_id, normal_late.session_id, low.session_id]);
	}

	#[test]
	fn remove_then_position_of_is_none() {
		let mut set = WaitingSet::new();
		let e = entry(Priority::Normal, 0);
		set.insert(e.clone(), "u1");
		assert_eq!(set.position_of(e.session_id), Some(0));
		set.remove(e.session_id);
		assert_eq!(set.position_of(e.session_id), None);
		assert!(set.is_empty());
	}

	#[test]
	fn reinsert_moves_position_for_priority_change() {
		let mut set = WaitingSet::new();
		let a = entry(Priority::Normal, -5);
		let b = entry(Priority::Normal, 0);
		set.insert(a.clone(), "u1");
		set.insert(b.clone(), "u2");
		assert_eq!(set.position_of(a.session_id), Some(0));

		let promoted = WaitingEntry {
			priority: Priority::Vip,
			enqueued_at: a.enqueued_at,
			session_id: a.session_id,
		};
		set.insert(promoted, "u1");
		assert_eq!(set.position_of(a.session_id), Some(0));
		assert_eq!(set.size(), 2);
	}

	#[test]
	fn update_priority_preserves_user_binding() {
		let mut set = WaitingSet::new();
		let e = entry(Priority::Low, 0);
		set.insert(e.clone(), "alice");
		assert!(set.update_priority(e.session_id, Priority::Vip));
		assert_eq!(set.session_for_user("alice"), Some(e.session_id));
		assert_eq!(set.position_of(e.session_id), Some(0));
	}

	#[test]
	fn session_for_user_tracks_latest_identifier_binding() {
		let mut set = WaitingSet::new();
		let e = entry(Priority::Normal, 0);
		set.insert(e.clone(), "alice");
		assert_eq!(set.session_for_user("alice"), Some(e.session_id));
		set.remove(e.session_id);
		assert_eq!(set.session_for_user("alice"), None);
	}
}
