//! HTTP error taxonomy: every handler returns `Result<_, Error>` and this
//! is the single place mapping domain/infra failures onto status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use waitroom_core::error::EngineError;
use waitroom_push::PushError;
use waitroom_ratelimit::RateLimitError;
use waitroom_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{field}: {message}")]
	Validation { field: String, message: String },

	#[error("not found")]
	NotFound,

	#[error("{0}")]
	Conflict(String),

	#[error("{0}")]
	ScheduleClosed(String),

	#[error("{0}")]
	RateLimited(String),

	#[error("{0}")]
	Unauthorized(String),

	#[error("{0}")]
	Forbidden(String),

	#[error(transparent)]
	Internal(#[from] anyhow::Error),
}

impl Error {
	#[must_use]
	pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Validation {
			field: field.into(),
			message: message.into(),
		}
	}
}

impl From<EngineError> for Error {
	fn from(err: EngineError) -> Self {
		match err {
			EngineError::QueueNotFound(_) | EngineError::SessionNotFound(_) => Self::NotFound,
			EngineError::AlreadyEnqueued(user) => Self::Conflict(format!("user {user} is already in queue")),
			EngineError::ScheduleClosed => Self::ScheduleClosed("queue is outside its scheduled hours".to_string()),
			EngineError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
			EngineError::AlreadyRunning(_) | EngineError::NotRunning(_) | EngineError::Internal(_) => Self::Internal(anyhow::anyhow!(err)),
		}
	}
}

impl From<StoreError> for Error {
	fn from(err: StoreError) -> Self {
		EngineError::from(err).into()
	}
}

impl From<RateLimitError> for Error {
	fn from(err: RateLimitError) -> Self {
		match err {
			RateLimitError::Limited { retry_after_secs } => Self::RateLimited(format!("rate limit exceeded, retry after {retry_after_secs}s")),
		}
	}
}

impl From<PushError> for Error {
	fn from(err: PushError) -> Self {
		match err {
			PushError::InvalidTenantContext => Self::Unauthorized("invalid tenant context".to_string()),
			PushError::NotFound(_) => Self::NotFound,
			PushError::ActorUnavailable => Self::Internal(anyhow::anyhow!(err)),
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			Self::Validation { field, message } => (StatusCode::BAD_REQUEST, json!({ "error": "validation", "field": field, "message": message })),
			Self::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "not_found", "message": "not found" })),
			Self::Conflict(message) => (StatusCode::CONFLICT, json!({ "error": "conflict", "message": message })),
			Self::ScheduleClosed(message) => (StatusCode::CONFLICT, json!({ "error": "schedule_closed", "message": message })),
			Self::RateLimited(message) => (StatusCode::TOO_MANY_REQUESTS, json!({ "error": "rate_limited", "message": message })),
			Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, json!({ "error": "unauthorized", "message": message })),
			Self::Forbidden(message) => (StatusCode::FORBIDDEN, json!({ "error": "forbidden", "message": message })),
			Self::Internal(err) => {
				tracing::error!(error = %err, "internal error");
				(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal", "message": "internal server error" }))
			}
		};
		(status, Json(body)).into_response()
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
