//! Core entities. Kept free of navigation collections: a `Queue` never carries
//! its sessions and a `Tenant` never carries its queues. Lookups always go
//! through the owning facade, keyed by id.

use crate::ids::{QueueId, SessionId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
	pub id: TenantId,
	pub name: String,
	/// API key used for `X-Tenant-Key` resolution, tried before `domain`.
	pub tenant_key: String,
	/// Unique DNS domain used for host-based resolution when no
	/// `X-Tenant-Key` header is present.
	pub domain: Option<String>,
	pub active: bool,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Queue {
	pub id: QueueId,
	pub tenant_id: TenantId,
	pub name: String,
	pub description: Option<String>,
	pub active: bool,
	pub max_concurrent_users: u32,
	/// Steady-state emission ceiling, `ReleaseRatePerMinute` in spec terms.
	pub release_rate_per_minute: u32,
	pub tick_interval_ms: u64,
	/// Wall-clock moment the budget accrual was last reset, advanced on
	/// every tick (whether or not it emitted) so the token bucket never
	/// discharges a backlog the instant a closed queue reopens.
	pub last_release_at: Option<DateTime<Utc>>,
	pub schedule: Option<Schedule>,
	pub created_at: DateTime<Utc>,
}

/// Weekly recurring windows keyed by lowercase 3-letter day, half-open
/// `[start, end)` local times in `timezone`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
	pub timezone: String,
	pub windows: std::collections::HashMap<String, Vec<DayWindow>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DayWindow {
	pub start: (u32, u32),
	pub end: (u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
	Low,
	Normal,
	High,
	Vip,
}

impl Default for Priority {
	fn default() -> Self {
		Self::Normal
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
	Waiting,
	Serving,
	Released,
	Dropped,
}

impl SessionStatus {
	/// A strict state-machine edge. `MarkServing` is the
	/// only non-idempotent operation; callers needing idempotent semantics
	/// for `MarkReleased`/`MarkDropped` should check `self == next` first
	/// rather than relying on this returning `true` for a no-op.
	#[must_use]
	pub const fn can_transition_to(self, next: Self) -> bool {
		matches!(
			(self, next),
			(Self::Waiting, Self::Serving) | (Self::Serving, Self::Released) | (Self::Waiting, Self::Released) | (Self::Waiting, Self::Dropped)
		)
	}

	/// Whether repeating the transition into `next` when already in `next`
	/// should be treated as a successful no-op rather than `InvalidTransition`.
	/// Every transition except entry into `Serving` is idempotent.
	#[must_use]
	pub const fn is_idempotent_into(next: Self) -> bool {
		!matches!(next, Self::Serving)
	}

	#[must_use]
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Released | Self::Dropped)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
	pub id: SessionId,
	pub tenant_id: TenantId,
	pub queue_id: QueueId,
	pub user_identifier: String,
	/// Caller-supplied free-form context, capped at 1000 chars at the API boundary.
	pub metadata: Option<String>,
	pub priority: Priority,
	pub status: SessionStatus,
	pub enqueued_at: DateTime<Utc>,
	pub served_at: Option<DateTime<Utc>>,
	pub released_at: Option<DateTime<Utc>>,
	/// 0 when not `Waiting`; otherwise a point-in-time snapshot, not kept
	/// continuously in sync — callers needing a live value should ask the
	/// release controller's `PositionOf` query.
	pub position: u64,
}

impl UserSession {
	/// Total order used by the waiting set: priority desc, enqueued_at asc,
	/// session id asc as the final tie-break.
	#[must_use]
	pub fn ordering_key(&self) -> (std::cmp::Reverse<Priority>, DateTime<Utc>, SessionId) {
		(std::cmp::Reverse(self.priority), self.enqueued_at, self.id)
	}
}

/// Ordering wrapper used by the waiting set's `BTreeSet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingEntry {
	pub priority: Priority,
	pub enqueued_at: DateTime<Utc>,
	pub session_id: SessionId,
}

impl WaitingEntry {
	#[must_use]
	pub fn from_session(session: &UserSession) -> Self {
		Self {
			priority: session.priority,
			enqueued_at: session.enqueued_at,
			session_id: session.id,
		}
	}
}

impl Ord for WaitingEntry {
	fn cmp(&self, other: &Self) -> Ordering {
		other
			.priority
			.cmp(&self.priority)
			.then_with(|| self.enqueued_at.cmp(&other.enqueued_at))
			.then_with(|| self.session_id.cmp(&other.session_id))
	}
}

impl PartialOrd for WaitingEntry {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
