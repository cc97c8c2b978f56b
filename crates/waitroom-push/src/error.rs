use crate::ids::ConnectionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PushError {
	#[error("invalid tenant context")]
	InvalidTenantContext,

	#[error("connection {0} not found")]
	NotFound(ConnectionId),

	#[error("connection actor unavailable")]
	ActorUnavailable,
}
