use crate::group::GroupKey;
use crate::messages::ServerMessage;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum ConnectionCommand {
	Join(GroupKey),
	Leave(GroupKey),
	/// Deliver a message the connection should forward to its client;
	/// dropped silently if the connection's outbound channel is full, since
	/// push delivery is best-effort.
	Deliver(ServerMessage),
	RecordActivity,
	CheckStale {
		timeout: Duration,
		reply: oneshot::Sender<bool>,
	},
	Groups {
		reply: oneshot::Sender<HashSet<GroupKey>>,
	},
	Shutdown,
}
