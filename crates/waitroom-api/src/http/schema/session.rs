use crate::http::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waitroom_core::ids::{QueueId, SessionId};
use waitroom_core::model::{Priority, SessionStatus, UserSession};

const MAX_USER_IDENTIFIER_LEN: usize = 255;
const MAX_METADATA_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
	pub user_identifier: String,
	pub metadata: Option<String>,
	#[serde(default)]
	pub priority: Priority,
}

impl EnqueueRequest {
	pub fn validate(&self) -> Result<(), Error> {
		if self.user_identifier.is_empty() || self.user_identifier.len() > MAX_USER_IDENTIFIER_LEN {
			return Err(Error::validation("user_identifier", "must be between 1 and 255 characters"));
		}
		if let Some(metadata) = &self.metadata {
			if metadata.len() > MAX_METADATA_LEN {
				return Err(Error::validation("metadata", "must not exceed 1000 characters"));
			}
		}
		Ok(())
	}
}

#[derive(Debug, Serialize)]
pub struct UserSessionDto {
	pub id: SessionId,
	pub queue_id: QueueId,
	pub user_identifier: String,
	pub metadata: Option<String>,
	pub priority: Priority,
	pub status: SessionStatus,
	pub enqueued_at: DateTime<Utc>,
	pub served_at: Option<DateTime<Utc>>,
	pub released_at: Option<DateTime<Utc>>,
	pub position: usize,
}

impl UserSessionDto {
	#[must_use]
	pub fn from_session(session: UserSession, position: usize) -> Self {
		Self {
			id: session.id,
			queue_id: session.queue_id,
			user_identifier: session.user_identifier,
			metadata: session.metadata,
			priority: session.priority,
			status: session.status,
			enqueued_at: session.enqueued_at,
			served_at: session.served_at,
			released_at: session.released_at,
			position,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
	pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
	pub released_count: usize,
	pub released_session_ids: Vec<SessionId>,
}
