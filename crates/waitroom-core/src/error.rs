use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
	#[error("queue {0} not found")]
	QueueNotFound(crate::ids::QueueId),

	#[error("session {0} not found")]
	SessionNotFound(crate::ids::SessionId),

	#[error("invalid status transition: {from:?} -> {to:?}")]
	InvalidTransition {
		from: crate::model::SessionStatus,
		to: crate::model::SessionStatus,
	},

	#[error("queue is closed by schedule")]
	ScheduleClosed,

	#[error("controller for queue {0} is already running")]
	AlreadyRunning(crate::ids::QueueId),

	#[error("controller for queue {0} is not running")]
	NotRunning(crate::ids::QueueId),

	#[error("user {0} already has an active session in this queue")]
	AlreadyEnqueued(String),

	#[error("internal error: {0}")]
	Internal(String),
}

impl EngineError {
	/// Distinguishes a store failure the release controller should stop
	/// over from one a retry on the next tick can recover from. Only a
	/// missing queue counts as structural: the backing rows are gone, so
	/// no amount of retrying produces a different answer.
	#[must_use]
	pub const fn is_structural(&self) -> bool {
		matches!(self, Self::QueueNotFound(_))
	}
}
