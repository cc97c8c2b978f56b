//! Per-tenant webhook subscription registry. Read-mostly, so each
//! tenant's subscription list sits behind a
//! `tokio::sync::RwLock` inside a `DashMap` keyed by tenant — readers never
//! block each other, writers (register/deregister/toggle) are rare.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;
use waitroom_core::ids::TenantId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
	pub id: Uuid,
	pub tenant_id: TenantId,
	pub event_type: String,
	pub url: String,
	pub secret: Option<String>,
	pub active: bool,
}

impl WebhookSubscription {
	#[must_use]
	pub fn new(tenant_id: TenantId, event_type: impl Into<String>, url: impl Into<String>, secret: Option<String>) -> Self {
		Self {
			id: Uuid::new_v4(),
			tenant_id,
			event_type: event_type.into(),
			url: url.into(),
			secret,
			active: true,
		}
	}
}

#[derive(Default)]
pub struct SubscriptionRegistry {
	by_tenant: DashMap<TenantId, RwLock<Vec<WebhookSubscription>>>,
}

impl SubscriptionRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn register(&self, subscription: WebhookSubscription) {
		let tenant_id = subscription.tenant_id;
		let entry = self.by_tenant.entry(tenant_id).or_default();
		entry.write().await.push(subscription);
	}

	/// Returns `true` if a subscription with `subscription_id` existed and
	/// was removed.
	pub async fn deregister(&self, tenant_id: TenantId, subscription_id: Uuid) -> bool {
		let Some(entry) = self.by_tenant.get(&tenant_id) else {
			return false;
		};
		let mut subscriptions = entry.write().await;
		let before = subscriptions.len();
		subscriptions.retain(|s| s.id != subscription_id);
		subscriptions.len() != before
	}

	pub async fn set_active(&self, tenant_id: TenantId, subscription_id: Uuid, active: bool) -> bool {
		let Some(entry) = self.by_tenant.get(&tenant_id) else {
			return false;
		};
		let mut subscriptions = entry.write().await;
		if let Some(subscription) = subscriptions.iter_mut().find(|s| s.id == subscription_id) {
			subscription.active = active;
			true
		} else {
			false
		}
	}

	/// Active subscriptions for `tenant_id` whose `event_type` matches.
	pub async fn matching(&self, tenant_id: TenantId, event_type: &str) -> Vec<WebhookSubscription> {
		let Some(entry) = self.by_tenant.get(&tenant_id) else {
			return Vec::new();
		};
		entry.read().await.iter().filter(|s| s.active && s.event_type == event_type).cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn matching_returns_only_active_subscriptions_for_the_event_type() {
		let registry = SubscriptionRegistry::new();
		let tenant_id = TenantId::new();
		registry.register(WebhookSubscription::new(tenant_id, "session_released", "https://example.com/a", None)).await;
		let mut inactive = WebhookSubscription::new(tenant_id, "session_released", "https://example.com/b", None);
		inactive.active = false;
		registry.register(inactive).await;
		registry.register(WebhookSubscription::new(tenant_id, "session_dropped", "https://example.com/c", None)).await;

		let matched = registry.matching(tenant_id, "session_released").await;
		assert_eq!(matched.len(), 1);
		assert_eq!(matched[0].url, "https://example.com/a");
	}

	#[tokio::test]
	async fn deregister_removes_the_subscription() {
		let registry = SubscriptionRegistry::new();
		let tenant_id = TenantId::new();
		let subscription = WebhookSubscription::new(tenant_id, "session_released", "https://example.com/a", None);
		let id = subscription.id;
		registry.register(subscription).await;

		assert!(registry.deregister(tenant_id, id).await);
		assert!(registry.matching(tenant_id, "session_released").await.is_empty());
		assert!(!registry.deregister(tenant_id, id).await);
	}

	#[tokio::test]
	async fn set_active_toggles_a_subscription_without_removing_it() {
		let registry = SubscriptionRegistry::new();
		let tenant_id = TenantId::new();
		let subscription = WebhookSubscription::new(tenant_id, "session_released", "https://example.com/a", None);
		let id = subscription.id;
		registry.register(subscription).await;

		assert!(registry.set_active(tenant_id, id, false).await);
		assert!(registry.matching(tenant_id, "session_released").await.is_empty());

		assert!(registry.set_active(tenant_id, id, true).await);
		assert_eq!(registry.matching(tenant_id, "session_released").await.len(), 1);
	}
}
