use crate::ids::{QueueId, SessionId};

/// Narrow event shape emitted by the controller. `waitroom-events` wraps
/// these in the full envelope (tenant id, timestamp, user identifier).
#[derive(Debug, Clone)]
pub enum ControllerEvent {
	/// A waiting session was admitted into `Serving`, consuming one cap slot.
	UserServed { queue_id: QueueId, session_id: SessionId },
	/// A `Serving` session finished and was transitioned to `Released`,
	/// freeing the cap slot it held.
	UserReleased { queue_id: QueueId, session_id: SessionId },
	UserDropped { queue_id: QueueId, session_id: SessionId },
	QueueSuspended { queue_id: QueueId },
	QueueResumed { queue_id: QueueId },
}
