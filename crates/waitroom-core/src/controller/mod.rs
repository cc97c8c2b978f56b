//! Release controller: one tick-driven engine per active `(tenant,
//! queue)`, built as a command-channel/handle pair the way a tick engine
//! owns its mutable state behind an actor loop. `ControllerHandle` is cheap
//! to clone and carries no mutable state itself; all state lives in the
//! spawned `ControllerEngine` task.

mod command;
mod engine;
mod events;
mod handle;
mod state;

pub use command::ControllerCommand;
pub use engine::ControllerEngine;
pub use events::ControllerEvent;
pub use handle::ControllerHandle;
pub use state::ControllerState;

use crate::error::EngineError;
use crate::ids::{QueueId, SessionId};
use crate::model::UserSession;
use async_trait::async_trait;

/// Facade the controller needs from the session store. Kept narrow and
/// `async_trait`-object-safe so the engine never depends on a concrete
/// storage backend.
#[async_trait]
pub trait SessionStore: Send + Sync {
	async fn get(&self, id: SessionId) -> Result<Option<UserSession>, EngineError>;
	async fn bulk_transition(&self, ids: &[SessionId], to: crate::model::SessionStatus) -> Result<Vec<SessionId>, EngineError>;
	async fn count_serving(&self, queue_id: QueueId) -> Result<u32, EngineError>;
}

/// Sink the controller pushes domain events into; `waitroom-events` adapts
/// this into the full event envelope (tenant/queue/user/timestamp).
pub trait EventPublisher: Send + Sync {
	fn publish(&self, event: ControllerEvent);
}
