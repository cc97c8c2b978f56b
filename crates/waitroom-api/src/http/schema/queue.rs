use crate::http::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waitroom_core::ids::{QueueId, TenantId};
use waitroom_core::model::{Queue, Schedule};

pub const MAX_CONCURRENT_USERS_RANGE: std::ops::RangeInclusive<u32> = 1..=10_000;
pub const RELEASE_RATE_RANGE: std::ops::RangeInclusive<u32> = 1..=1_000;

#[derive(Debug, Deserialize)]
pub struct CreateQueueRequest {
	pub name: String,
	pub description: Option<String>,
	pub max_concurrent_users: u32,
	pub release_rate_per_minute: u32,
}

impl CreateQueueRequest {
	pub fn validate(&self) -> Result<(), Error> {
		if self.name.trim().is_empty() {
			return Err(Error::validation("name", "must not be empty"));
		}
		if !MAX_CONCURRENT_USERS_RANGE.contains(&self.max_concurrent_users) {
			return Err(Error::validation("max_concurrent_users", "must be between 1 and 10000"));
		}
		if !RELEASE_RATE_RANGE.contains(&self.release_rate_per_minute) {
			return Err(Error::validation("release_rate_per_minute", "must be between 1 and 1000"));
		}
		Ok(())
	}
}

#[derive(Debug, Deserialize)]
pub struct UpdateQueueRequest {
	pub name: Option<String>,
	pub description: Option<String>,
	pub max_concurrent_users: Option<u32>,
	pub release_rate_per_minute: Option<u32>,
}

impl UpdateQueueRequest {
	pub fn validate(&self) -> Result<(), Error> {
		if let Some(name) = &self.name {
			if name.trim().is_empty() {
				return Err(Error::validation("name", "must not be empty"));
			}
		}
		if let Some(cap) = self.max_concurrent_users {
			if !MAX_CONCURRENT_USERS_RANGE.contains(&cap) {
				return Err(Error::validation("max_concurrent_users", "must be between 1 and 10000"));
			}
		}
		if let Some(rate) = self.release_rate_per_minute {
			if !RELEASE_RATE_RANGE.contains(&rate) {
				return Err(Error::validation("release_rate_per_minute", "must be between 1 and 1000"));
			}
		}
		Ok(())
	}
}

#[derive(Debug, Serialize)]
pub struct QueueDto {
	pub id: QueueId,
	pub tenant_id: TenantId,
	pub name: String,
	pub description: Option<String>,
	pub active: bool,
	pub max_concurrent_users: u32,
	pub release_rate_per_minute: u32,
	pub schedule: Option<Schedule>,
	pub created_at: DateTime<Utc>,
}

impl From<Queue> for QueueDto {
	fn from(queue: Queue) -> Self {
		Self {
			id: queue.id,
			tenant_id: queue.tenant_id,
			name: queue.name,
			description: queue.description,
			active: queue.active,
			max_concurrent_users: queue.max_concurrent_users,
			release_rate_per_minute: queue.release_rate_per_minute,
			schedule: queue.schedule,
			created_at: queue.created_at,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
	pub check_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
	pub active: bool,
	pub queue_active: bool,
	pub schedule_active: bool,
	pub check_time: DateTime<Utc>,
}
