//! Wire messages for the `/queuehub` push channel.

use serde::{Deserialize, Serialize};
use waitroom_core::ids::{QueueId, SessionId};

/// The four client-initiated operations. Deserialized off the websocket; a
/// frame that doesn't match one of these shapes is rejected with
/// [`ServerMessage::Error`] rather than closing the connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
	JoinQueueGroup { queue_id: QueueId },
	LeaveQueueGroup { queue_id: QueueId },
	SubscribeToUserUpdates { user_identifier: String },
	UnsubscribeFromUserUpdates { user_identifier: String },
}

/// Outbound notifications. `QueueUpdated`/`UserUpdated`/`PositionUpdated`/
/// `UserReleased`/`QueueStatistics` are fanned out from the event bus;
/// `Joined*`/`Left*`/`Error` are direct replies to a client operation, not
/// bus-sourced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
	JoinedQueue { queue_id: QueueId },
	LeftQueue { queue_id: QueueId },
	SubscribedToUser { user_identifier: String },
	UnsubscribedFromUser { user_identifier: String },
	QueueUpdated { queue_id: QueueId, active: bool },
	UserUpdated { queue_id: QueueId, user_identifier: String, status: String },
	PositionUpdated { queue_id: QueueId, user_identifier: String, position: usize },
	UserReleased { queue_id: QueueId, session_id: SessionId },
	QueueStatistics { queue_id: QueueId, waiting: u32, serving: u32 },
	Error { message: String },
}
