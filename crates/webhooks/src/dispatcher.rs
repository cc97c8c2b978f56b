//! Webhook dispatcher: consumes the event bus and fans matching
//! events out to tenant-registered URLs. Each delivery (including its
//! retries) runs in its own `tokio::spawn`'d task so a slow or down
//! subscriber never blocks the bus subscriber loop that fed it, per the
//! concurrency model's "shared worker pools for webhook dispatch" note.

use crate::config::Config;
use crate::payload::WebhookPayload;
use crate::signer::sign;
use crate::subscription::{SubscriptionRegistry, WebhookSubscription};
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use waitroom_events::{Event, EventKind, EventSubscriber};

#[must_use]
pub fn event_type_name(kind: &EventKind) -> &'static str {
	match kind {
		EventKind::SessionEnqueued => "session_enqueued",
		EventKind::SessionPositionChanged { .. } => "session_position_changed",
		EventKind::SessionReleased => "session_released",
		EventKind::SessionDropped => "session_dropped",
		EventKind::SessionManuallyReleased => "session_manually_released",
		EventKind::SessionServed => "session_served",
		EventKind::QueueCreated => "queue_created",
		EventKind::QueueActivated => "queue_activated",
		EventKind::QueueDeactivated => "queue_deactivated",
		EventKind::QueueCapacityChanged { .. } => "queue_capacity_changed",
		EventKind::QueueScheduleChanged => "queue_schedule_changed",
		EventKind::QueueSuspendedBySchedule => "queue_suspended_by_schedule",
		EventKind::TenantCreated => "tenant_created",
		EventKind::TenantActivated => "tenant_activated",
		EventKind::TenantDeactivated => "tenant_deactivated",
		EventKind::RateLimitExceeded { .. } => "rate_limit_exceeded",
		EventKind::WebhookDeliveryFailed { .. } => "webhook_delivery_failed",
	}
}

fn event_data(event: &Event) -> serde_json::Value {
	json!({
		"queue_id": event.queue_id,
		"session_id": event.session_id,
		"user_identifier": event.user_identifier,
		"kind": event.kind,
	})
}

/// Outcome of one delivery attempt sequence, logged
/// ("outcome, status code, duration").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
	Success,
	Abandoned,
	Exhausted,
}

pub struct WebhookDispatcher {
	config: Config,
	client: reqwest::Client,
	subscriptions: Arc<SubscriptionRegistry>,
}

impl WebhookDispatcher {
	#[must_use]
	pub fn new(config: Config, subscriptions: Arc<SubscriptionRegistry>) -> Self {
		let client = reqwest::Client::builder().timeout(config.delivery_timeout).build().unwrap_or_default();
		Self { config, client, subscriptions }
	}

	/// Drains `subscriber` until the bus closes or `cancel_token` fires,
	/// spawning one delivery task per matching subscription.
	pub async fn run(self: Arc<Self>, mut subscriber: EventSubscriber, cancel_token: CancellationToken) {
		loop {
			tokio::select! {
				event = subscriber.recv() => {
					let Some(event) = event else { break };
					self.clone().dispatch_event(event, cancel_token.child_token());
				}
				() = cancel_token.cancelled() => break,
			}
		}
	}

	fn dispatch_event(self: Arc<Self>, event: Event, cancel_token: CancellationToken) {
		let event_type = event_type_name(&event.kind);
		let tenant_id = event.tenant_id;
		let payload = WebhookPayload::new(event_type, tenant_id, event_data(&event), event.ts);

		tokio::spawn(async move {
			let subscriptions = self.subscriptions.matching(tenant_id, event_type).await;
			for subscription in subscriptions {
				let dispatcher = self.clone();
				let payload = payload.clone();
				let cancel_token = cancel_token.clone();
				tokio::spawn(async move { dispatcher.deliver_with_retry(subscription, payload, cancel_token).await });
			}
		});
	}

	async fn deliver_with_retry(&self, subscription: WebhookSubscription, payload: WebhookPayload, cancel_token: CancellationToken) {
		let Ok(body) = serde_json::to_vec(&payload) else {
			warn!(subscription_id = %subscription.id, "failed to serialize webhook payload");
			return;
		};

		let mut delay = self.config.base_delay;
		for attempt in 1..=self.config.max_attempts {
			if cancel_token.is_cancelled() {
				return;
			}

			let started = std::time::Instant::now();
			let outcome = tokio::select! {
				result = self.send_once(&subscription, &body) => result,
				() = cancel_token.cancelled() => return,
			};
			let elapsed = started.elapsed();

			match outcome {
				Ok(status) if (200..300).contains(&status) => {
					info!(subscription_id = %subscription.id, status, attempt, ?elapsed, "webhook delivered");
					return;
				}
				Ok(status) if (400..500).contains(&status) => {
					warn!(subscription_id = %subscription.id, status, attempt, ?elapsed, "webhook abandoned: client error");
					return;
				}
				Ok(status) => {
					warn!(subscription_id = %subscription.id, status, attempt, ?elapsed, "webhook retrying: server error");
				}
				Err(error) => {
					warn!(subscription_id = %subscription.id, %error, attempt, ?elapsed, "webhook retrying: network error");
				}
			}

			if attempt < self.config.max_attempts {
				tokio::time::sleep(jittered(delay, self.config.jitter_ratio)).await;
				delay = delay.mul_f64(self.config.backoff_factor);
			}
		}
		warn!(subscription_id = %subscription.id, attempts = self.config.max_attempts, "webhook delivery exhausted all retries");
	}

	async fn send_once(&self, subscription: &WebhookSubscription, body: &[u8]) -> reqwest::Result<u16> {
		let mut request = self.client.post(&subscription.url).header("content-type", "application/json").body(body.to_vec());
		if let Some(secret) = &subscription.secret {
			request = request.header("X-Signature", sign(secret, body));
		}
		let response = request.send().await?;
		Ok(response.status().as_u16())
	}
}

fn jittered(base: Duration, jitter_ratio: f64) -> Duration {
	if jitter_ratio <= 0.0 {
		return base;
	}
	let spread = base.as_secs_f64() * jitter_ratio;
	let offset = rand::thread_rng().gen_range(-spread..=spread);
	Duration::from_secs_f64((base.as_secs_f64() + offset).max(0.0))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn jittered_delay_stays_within_the_configured_ratio() {
		let base = Duration::from_millis(1000);
		for _ in 0..50 {
			let delay = jittered(base, 0.2);
			assert!(delay.as_millis() >= 800 && delay.as_millis() <= 1200);
		}
	}

	#[test]
	fn zero_jitter_returns_the_base_delay_unchanged() {
		let base = Duration::from_millis(500);
		assert_eq!(jittered(base, 0.0), base);
	}

	#[test]
	fn event_type_names_are_snake_case_and_stable() {
		assert_eq!(event_type_name(&EventKind::SessionReleased), "session_released");
		assert_eq!(event_type_name(&EventKind::QueueSuspendedBySchedule), "queue_suspended_by_schedule");
	}
}
