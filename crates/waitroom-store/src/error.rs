use thiserror::Error;
use waitroom_core::ids::{QueueId, SessionId};
use waitroom_core::model::SessionStatus;

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("session {0} not found")]
	NotFound(SessionId),

	#[error("session {0} already exists")]
	AlreadyExists(SessionId),

	#[error("user {0} already has an active session in this queue")]
	AlreadyEnqueued(String),

	#[error("queue {0} not found")]
	QueueNotFound(QueueId),

	#[error("invalid status transition: {from:?} -> {to:?}")]
	InvalidTransition { from: SessionStatus, to: SessionStatus },
}

impl From<StoreError> for waitroom_core::error::EngineError {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::NotFound(id) => Self::SessionNotFound(id),
			StoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
			StoreError::AlreadyExists(id) => Self::Internal(format!("session {id} already exists")),
			StoreError::AlreadyEnqueued(user) => Self::AlreadyEnqueued(user),
			StoreError::QueueNotFound(id) => Self::QueueNotFound(id),
		}
	}
}
