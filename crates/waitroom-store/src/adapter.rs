//! Bridges the full [`crate::store::SessionStore`] facade to the narrow
//! trait the release controller depends on, so `waitroom-core` never needs
//! to know this crate exists.

use crate::store::SessionStore as FullSessionStore;
use async_trait::async_trait;
use std::sync::Arc;
use waitroom_core::controller::SessionStore as ControllerSessionStore;
use waitroom_core::error::EngineError;
use waitroom_core::ids::{QueueId, SessionId};
use waitroom_core::model::{SessionStatus, UserSession};

pub struct ControllerStoreAdapter<S> {
	inner: Arc<S>,
}

impl<S> ControllerStoreAdapter<S> {
	#[must_use]
	pub const fn new(inner: Arc<S>) -> Self {
		Self { inner }
	}
}

#[async_trait]
impl<S: FullSessionStore + Send + Sync> ControllerSessionStore for ControllerStoreAdapter<S> {
	async fn get(&self, id: SessionId) -> Result<Option<UserSession>, EngineError> {
		self.inner.get(id).await.map_err(Into::into)
	}

	async fn bulk_transition(&self, ids: &[SessionId], to: SessionStatus) -> Result<Vec<SessionId>, EngineError> {
		self.inner.bulk_transition(ids, to).await.map_err(Into::into)
	}

	async fn count_serving(&self, queue_id: QueueId) -> Result<u32, EngineError> {
		self.inner.count_by_status(queue_id, SessionStatus::Serving).await.map_err(Into::into)
	}
}
