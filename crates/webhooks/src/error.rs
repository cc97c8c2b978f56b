use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum WebhookError {
	#[error("subscription {0} not found")]
	NotFound(Uuid),

	#[error("invalid webhook url: {0}")]
	InvalidUrl(String),

	#[error("failed to build delivery request: {0}")]
	Request(#[from] reqwest::Error),

	#[error("failed to serialize delivery payload: {0}")]
	Serialization(#[from] serde_json::Error),
}
