//! Server-side-only group naming: clients never supply a group
//! name directly, only the `(queue_id)`/`(user_identifier)` they want and
//! the tenant context carried by their connection — the name itself
//! (`queue_{tenant}_{queue}`, `user_{tenant}_{user}`) is derived here.

use serde::{Deserialize, Serialize};
use waitroom_core::ids::{QueueId, TenantId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKey {
	Queue { tenant_id: TenantId, queue_id: QueueId },
	User { tenant_id: TenantId, user_identifier: String },
}

impl GroupKey {
	#[must_use]
	pub fn name(&self) -> String {
		match self {
			Self::Queue { tenant_id, queue_id } => format!("queue_{tenant_id}_{queue_id}"),
			Self::User { tenant_id, user_identifier } => format!("user_{tenant_id}_{user_identifier}"),
		}
	}

	#[must_use]
	pub const fn tenant_id(&self) -> TenantId {
		match self {
			Self::Queue { tenant_id, .. } | Self::User { tenant_id, .. } => *tenant_id,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn queue_group_name_matches_the_server_side_convention() {
		let tenant_id = TenantId::new();
		let queue_id = QueueId::new();
		let key = GroupKey::Queue { tenant_id, queue_id };
		assert_eq!(key.name(), format!("queue_{tenant_id}_{queue_id}"));
	}

	#[test]
	fn user_group_name_matches_the_server_side_convention() {
		let tenant_id = TenantId::new();
		let key = GroupKey::User {
			tenant_id,
			user_identifier: "alice".to_string(),
		};
		assert_eq!(key.name(), format!("user_{tenant_id}_alice"));
	}
}
