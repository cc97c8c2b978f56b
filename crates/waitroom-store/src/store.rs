//! Session store facade: the single seam between the engine and
//! durable storage. The trait's methods map directly onto single SQL
//! statements so a relational-backed implementation never needs a
//! multi-step read-modify-write exposed across the boundary.

use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use waitroom_core::ids::{QueueId, SessionId};
use waitroom_core::model::{SessionStatus, UserSession};

#[async_trait]
pub trait SessionStore: Send + Sync {
	/// Inserts a brand new session in `Waiting` status. Fails with
	/// [`StoreError::AlreadyEnqueued`] if a non-`Dropped` session already
	/// exists for `(queue_id, user_identifier)`.
	async fn add(&self, session: UserSession) -> Result<(), StoreError>;

	/// Transitions one session, enforcing the state machine. Idempotent for
	/// every target except `Serving`: retrying an already applied
	/// `MarkReleased`/`MarkDropped` succeeds as a no-op. Fails on an
	/// illegal transition or an unknown id.
	async fn transition(&self, id: SessionId, to: SessionStatus) -> Result<(), StoreError>;

	/// Transitions every id in `ids` to `to`, skipping ids that no longer
	/// permit the transition rather than failing the whole batch; returns
	/// the ids that actually changed.
	async fn bulk_transition(&self, ids: &[SessionId], to: SessionStatus) -> Result<Vec<SessionId>, StoreError>;

	async fn get(&self, id: SessionId) -> Result<Option<UserSession>, StoreError>;

	/// Latest non-`Dropped` session for `(queue_id, user_identifier)`, else
	/// the latest `Dropped` one, else `None`.
	async fn get_by_user(&self, queue_id: QueueId, user_identifier: &str) -> Result<Option<UserSession>, StoreError>;

	async fn list_waiting(&self, queue_id: QueueId) -> Result<Vec<UserSession>, StoreError>;

	async fn count_by_status(&self, queue_id: QueueId, status: SessionStatus) -> Result<u32, StoreError>;
}

/// Reference implementation backing the release controller and the HTTP
/// surface in this repository. A relational-backed `SessionStore` is a
/// drop-in replacement behind the same trait for a production deployment.
#[derive(Default)]
pub struct InMemorySessionStore {
	sessions: DashMap<SessionId, UserSession>,
	/// (queue, user_identifier) -> id of the latest non-`Dropped` session,
	/// enforcing the one-live-session-per-user invariant without scanning.
	live_by_user: DashMap<(QueueId, String), SessionId>,
}

impl InMemorySessionStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn stamp_timestamp(entry: &mut UserSession, to: SessionStatus) {
		let now = chrono::Utc::now();
		match to {
			SessionStatus::Serving if entry.served_at.is_none() => entry.served_at = Some(now),
			SessionStatus::Released if entry.released_at.is_none() => entry.released_at = Some(now),
			_ => {}
		}
	}
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
	async fn add(&self, session: UserSession) -> Result<(), StoreError> {
		if self.sessions.contains_key(&session.id) {
			return Err(StoreError::AlreadyExists(session.id));
		}
		let user_key = (session.queue_id, session.user_identifier.clone());
		if let Some(existing_id) = self.live_by_user.get(&user_key) {
			if let Some(existing) = self.sessions.get(&existing_id) {
				if existing.status != SessionStatus::Dropped {
					return Err(StoreError::AlreadyEnqueued(session.user_identifier.clone()));
				}
			}
		}
		self.live_by_user.insert(user_key, session.id);
		self.sessions.insert(session.id, session);
		Ok(())
	}

	async fn transition(&self, id: SessionId, to: SessionStatus) -> Result<(), StoreError> {
		let mut entry = self.sessions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
		if entry.status == to {
			return if SessionStatus::is_idempotent_into(to) { Ok(()) } else { Err(StoreError::InvalidTransition { from: entry.status, to }) };
		}
		if !entry.status.can_transition_to(to) {
			return Err(StoreError::InvalidTransition { from: entry.status, to });
		}
		entry.status = to;
		Self::stamp_timestamp(&mut entry, to);
		Ok(())
	}

	async fn bulk_transition(&self, ids: &[SessionId], to: SessionStatus) -> Result<Vec<SessionId>, StoreError> {
		// Snapshot-validate before mutating anything so a structural failure
		// (unknown id or illegal edge) rolls back the whole batch rather
		// than leaving a partial tick applied.
		for id in ids {
			let entry = self.sessions.get(id).ok_or(StoreError::NotFound(*id))?;
			if entry.status != to && !entry.status.can_transition_to(to) {
				return Err(StoreError::InvalidTransition { from: entry.status, to });
			}
		}
		let mut changed = Vec::with_capacity(ids.len());
		for id in ids {
			if let Some(mut entry) = self.sessions.get_mut(id) {
				if entry.status != to {
					entry.status = to;
					Self::stamp_timestamp(&mut entry, to);
					changed.push(*id);
				}
			}
		}
		Ok(changed)
	}

	async fn get(&self, id: SessionId) -> Result<Option<UserSession>, StoreError> {
		Ok(self.sessions.get(&id).map(|e| e.clone()))
	}

	async fn get_by_user(&self, queue_id: QueueId, user_identifier: &str) -> Result<Option<UserSession>, StoreError> {
		let Some(id) = self.live_by_user.get(&(queue_id, user_identifier.to_string())) else {
			return Ok(None);
		};
		Ok(self.sessions.get(&*id).map(|e| e.clone()))
	}

	async fn list_waiting(&self, queue_id: QueueId) -> Result<Vec<UserSession>, StoreError> {
		Ok(self
			.sessions
			.iter()
			.filter(|e| e.queue_id == queue_id && e.status == SessionStatus::Waiting)
			.map(|e| e.clone())
			.collect())
	}

	async fn count_by_status(&self, queue_id: QueueId, status: SessionStatus) -> Result<u32, StoreError> {
		Ok(self.sessions.iter().filter(|e| e.queue_id == queue_id && e.status == status).count() as u32)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use waitroom_core::ids::TenantId;
	use waitroom_core::model::Priority;

	fn session(queue_id: QueueId, status: SessionStatus) -> UserSession {
		UserSession {
			id: SessionId::new(),
			tenant_id: TenantId::new(),
			queue_id,
			user_identifier: format!("user-{}", SessionId::new()),
			metadata: None,
			priority: Priority::Normal,
			status,
			enqueued_at: chrono::Utc::now(),
			served_at: None,
			released_at: None,
			position: 0,
		}
	}

	#[tokio::test]
	async fn add_then_get_round_trips() {
		let store = InMemorySessionStore::new();
		let s = session(QueueId::new(), SessionStatus::Waiting);
		store.add(s.clone()).await.unwrap();
		let fetched = store.get(s.id).await.unwrap().unwrap();
		assert_eq!(fetched.id, s.id);
	}

	#[tokio::test]
	async fn transition_rejects_illegal_jump() {
		let store = InMemorySessionStore::new();
		let s = session(QueueId::new(), SessionStatus::Released);
		store.add(s.clone()).await.unwrap();
		let err = store.transition(s.id, SessionStatus::Waiting).await.unwrap_err();
		assert!(matches!(err, StoreError::InvalidTransition { .. }));
	}

	#[tokio::test]
	async fn transition_allows_direct_waiting_to_released() {
		let store = InMemorySessionStore::new();
		let s = session(QueueId::new(), SessionStatus::Waiting);
		store.add(s.clone()).await.unwrap();
		store.transition(s.id, SessionStatus::Released).await.unwrap();
		assert_eq!(store.get(s.id).await.unwrap().unwrap().status, SessionStatus::Released);
	}

	#[tokio::test]
	async fn repeated_mark_released_is_idempotent() {
		let store = InMemorySessionStore::new();
		let s = session(QueueId::new(), SessionStatus::Serving);
		store.add(s.clone()).await.unwrap();
		store.transition(s.id, SessionStatus::Released).await.unwrap();
		store.transition(s.id, SessionStatus::Released).await.unwrap();
	}

	#[tokio::test]
	async fn repeated_mark_serving_is_rejected() {
		let store = InMemorySessionStore::new();
		let s = session(QueueId::new(), SessionStatus::Serving);
		store.add(s.clone()).await.unwrap();
		let err = store.transition(s.id, SessionStatus::Serving).await.unwrap_err();
		assert!(matches!(err, StoreError::InvalidTransition { .. }));
	}

	#[tokio::test]
	async fn duplicate_enqueue_for_live_user_is_rejected() {
		let store = InMemorySessionStore::new();
		let queue_id = QueueId::new();
		let mut s1 = session(queue_id, SessionStatus::Waiting);
		s1.user_identifier = "dup-user".to_string();
		store.add(s1.clone()).await.unwrap();

		let mut s2 = session(queue_id, SessionStatus::Waiting);
		s2.user_identifier = "dup-user".to_string();
		let err = store.add(s2).await.unwrap_err();
		assert!(matches!(err, StoreError::AlreadyEnqueued(_)));

		store.transition(s1.id, SessionStatus::Dropped).await.unwrap();
		let mut s3 = session(queue_id, SessionStatus::Waiting);
		s3.user_identifier = "dup-user".to_string();
		store.add(s3).await.unwrap();
	}

	#[tokio::test]
	async fn bulk_transition_skips_ineligible_ids() {
		let store = InMemorySessionStore::new();
		let queue_id = QueueId::new();
		let waiting = session(queue_id, SessionStatus::Waiting);
		let already_serving = session(queue_id, SessionStatus::Serving);
		store.add(waiting.clone()).await.unwrap();
		store.add(already_serving.clone()).await.unwrap();

		let changed = store.bulk_transition(&[waiting.id, already_serving.id], SessionStatus::Serving).await.unwrap();
		assert_eq!(changed, vec![waiting.id]);
	}

	#[tokio::test]
	async fn list_waiting_filters_by_queue_and_status() {
		let store = InMemorySessionStore::new();
		let queue_a = QueueId::new();
		let queue_b = QueueId::new();
		store.add(session(queue_a, SessionStatus::Waiting)).await.unwrap();
		store.add(session(queue_a, SessionStatus::Serving)).await.unwrap();
		store.add(session(queue_b, SessionStatus::Waiting)).await.unwrap();

		let waiting = store.list_waiting(queue_a).await.unwrap();
		assert_eq!(waiting.len(), 1);
	}
}
