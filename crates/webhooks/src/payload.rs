//! Wire shape of a webhook delivery body:
//! `{id, event, tenant_id, data, timestamp}`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;
use waitroom_core::ids::TenantId;

#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
	pub id: Uuid,
	pub event: String,
	pub tenant_id: TenantId,
	pub data: Value,
	pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
	#[must_use]
	pub fn new(event: impl Into<String>, tenant_id: TenantId, data: Value, timestamp: DateTime<Utc>) -> Self {
		Self {
			id: Uuid::new_v4(),
			event: event.into(),
			tenant_id,
			data,
			timestamp,
		}
	}
}
