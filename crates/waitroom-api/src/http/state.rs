use crate::config::Config;
use crate::http::controller_registry::ControllerRegistry;
use crate::http::position_cache::PositionCache;
use std::sync::Arc;
use waitroom_events::EventBus;
use waitroom_push::PushRegistry;
use waitroom_ratelimit::RateLimitState;
use waitroom_store::{InMemorySessionStore, QueueRegistry, TenantRegistry};
use webhooks::SubscriptionRegistry;

/// Everything a handler needs, cloned cheaply (every field is an `Arc`).
#[derive(Clone)]
pub struct AppState {
	pub config: Arc<Config>,
	pub tenants: Arc<TenantRegistry>,
	pub queues: Arc<QueueRegistry>,
	pub store: Arc<InMemorySessionStore>,
	pub bus: Arc<EventBus>,
	pub controllers: Arc<ControllerRegistry>,
	pub webhooks: Arc<SubscriptionRegistry>,
	pub push: Arc<PushRegistry>,
	pub positions: Arc<PositionCache>,
	pub rate_limit: Arc<RateLimitState>,
}
