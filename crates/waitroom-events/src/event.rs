use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waitroom_core::ids::{QueueId, SessionId, TenantId};

/// The twelve event kinds the bus carries. Subscribers (push channel,
/// webhook dispatcher, analytics — external) match on `kind` and ignore
/// what they don't care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum EventKind {
	SessionEnqueued,
	SessionPositionChanged { position: usize },
	SessionReleased,
	SessionDropped,
	SessionManuallyReleased,
	SessionServed,
	QueueCreated,
	QueueActivated,
	QueueDeactivated,
	QueueCapacityChanged { max_concurrent_users: u32 },
	QueueScheduleChanged,
	QueueSuspendedBySchedule,
	TenantCreated,
	TenantActivated,
	TenantDeactivated,
	RateLimitExceeded { key: String },
	WebhookDeliveryFailed { subscription_id: uuid::Uuid, attempt: u32 },
}

/// Envelope every event travels in: tenant scope is mandatory, queue and
/// user are present when the event concerns a specific queue/session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
	pub tenant_id: TenantId,
	pub queue_id: Option<QueueId>,
	pub session_id: Option<SessionId>,
	pub user_identifier: Option<String>,
	pub kind: EventKind,
	pub ts: DateTime<Utc>,
}

impl Event {
	#[must_use]
	pub fn new(tenant_id: TenantId, kind: EventKind) -> Self {
		Self {
			tenant_id,
			queue_id: None,
			session_id: None,
			user_identifier: None,
			kind,
			ts: Utc::now(),
		}
	}

	#[must_use]
	pub fn with_queue(mut self, queue_id: QueueId) -> Self {
		self.queue_id = Some(queue_id);
		self
	}

	#[must_use]
	pub fn with_session(mut self, session_id: SessionId) -> Self {
		self.session_id = Some(session_id);
		self
	}

	#[must_use]
	pub fn with_user(mut self, user_identifier: impl Into<String>) -> Self {
		self.user_identifier = Some(user_identifier.into());
		self
	}
}
