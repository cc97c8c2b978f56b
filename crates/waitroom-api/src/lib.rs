pub mod config;
pub mod http;

use crate::config::Config;
use crate::http::controller_registry::ControllerRegistry;
use crate::http::position_cache::PositionCache;
use crate::http::state::AppState;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{filter::EnvFilter, fmt::format::JsonFields, layer::SubscriberExt, util::SubscriberInitExt, Layer};
use waitroom_events::EventBus;
use waitroom_push::{PushRegistry, PushRegistryConfig};
use waitroom_ratelimit::RateLimitState;
use waitroom_store::{InMemorySessionStore, QueueRegistry, TenantRegistry};
use webhooks::{SubscriptionRegistry, WebhookDispatcher};

const EVENT_BUS_CAPACITY: usize = 4096;

#[must_use]
pub fn init_tracing(config: &Config) -> Option<()> {
	let filter = EnvFilter::from_str(config.rust_log.as_deref()?).unwrap();

	tracing_subscriber::registry()
		.with(if config.log_json {
			Box::new(
				tracing_subscriber::fmt::layer()
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_filter(filter),
			) as Box<dyn Layer<_> + Send + Sync>
		} else {
			Box::new(
				tracing_subscriber::fmt::layer()
					.event_format(tracing_subscriber::fmt::format().pretty())
					.with_filter(filter),
			)
		})
		.init();
	Some(())
}

/// Wires every component together and runs the HTTP server until shutdown.
/// Tenant provisioning is a deployment-time concern (see `main.rs`), not an
/// HTTP surface, so `tenants` arrives pre-seeded.
pub async fn run(config: Config, tenants: TenantRegistry) -> anyhow::Result<()> {
	let root_token = CancellationToken::new();

	let store = Arc::new(InMemorySessionStore::new());
	let queues = Arc::new(QueueRegistry::new());
	let bus = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));
	let controllers = Arc::new(ControllerRegistry::new(store.clone(), bus.clone(), root_token.clone()));
	let webhook_subscriptions = Arc::new(SubscriptionRegistry::new());
	let push = Arc::new(PushRegistry::new(PushRegistryConfig::default(), root_token.clone()));
	let positions = Arc::new(PositionCache::new(Duration::from_secs(config.position_cache_ttl_secs)));
	let rate_limit = Arc::new(RateLimitState::new(config.rate_limit.clone()));

	let dispatcher = Arc::new(WebhookDispatcher::new(config.webhooks.clone(), webhook_subscriptions.clone()));
	tokio::spawn(dispatcher.run(bus.subscribe(), root_token.child_token()));

	let bridge_registry = push.clone();
	tokio::spawn(waitroom_push::bridge::run(bridge_registry, bus.subscribe(), root_token.child_token()));

	let sweep_push = push.clone();
	let sweep_token = root_token.child_token();
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(Duration::from_secs(30));
		loop {
			tokio::select! {
				_ = interval.tick() => sweep_push.sweep_stale().await,
				() = sweep_token.cancelled() => break,
			}
		}
	});

	let state = AppState {
		config: Arc::new(config.clone()),
		tenants: Arc::new(tenants),
		queues,
		store,
		bus,
		controllers,
		webhooks: webhook_subscriptions,
		push,
		positions,
		rate_limit,
	};

	let result = http::serve::serve(&config, state).await;
	root_token.cancel();
	result
}
