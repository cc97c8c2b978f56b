//! Webhook dispatcher: tenant-registered `(event_type, url, secret?,
//! active)` subscriptions delivered from the event bus with
//! HMAC-signed, retried HTTP POSTs. See `dispatcher::WebhookDispatcher`.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod payload;
pub mod signer;
pub mod subscription;

pub use config::Config;
pub use dispatcher::{event_type_name, DeliveryOutcome, WebhookDispatcher};
pub use error::WebhookError;
pub use payload::WebhookPayload;
pub use subscription::{SubscriptionRegistry, WebhookSubscription};
