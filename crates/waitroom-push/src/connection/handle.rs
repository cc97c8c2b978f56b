use super::command::ConnectionCommand;
use super::engine::ConnectionEngine;
use crate::error::PushError;
use crate::group::GroupKey;
use crate::ids::ConnectionId;
use crate::messages::ServerMessage;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cheap, cloneable front for a running [`ConnectionEngine`]. Held by
/// [`crate::registry::PushRegistry`]; the websocket task that owns the
/// actual socket holds `outbound_rx` and nothing else.
#[derive(Clone)]
pub struct ConnectionHandle {
	connection_id: ConnectionId,
	command_tx: mpsc::Sender<ConnectionCommand>,
	cancel_token: CancellationToken,
}

impl ConnectionHandle {
	/// Spawns the engine task and returns the handle plus the receiving end
	/// of its outbound message channel, which the caller hands to the
	/// websocket write loop.
	#[must_use]
	pub fn spawn(connection_id: ConnectionId, outbound_buffer: usize, parent_token: &CancellationToken) -> (Self, mpsc::Receiver<ServerMessage>, JoinHandle<()>) {
		let cancel_token = parent_token.child_token();
		let (command_tx, command_rx) = mpsc::channel(32);
		let (outbound_tx, outbound_rx) = mpsc::channel(outbound_buffer);

		let engine = ConnectionEngine::new(connection_id, outbound_tx);
		let task_handle = tokio::spawn(engine.run(command_rx, cancel_token.clone()));

		(
			Self {
				connection_id,
				command_tx,
				cancel_token,
			},
			outbound_rx,
			task_handle,
		)
	}

	#[must_use]
	pub const fn connection_id(&self) -> ConnectionId {
		self.connection_id
	}

	async fn send(&self, command: ConnectionCommand) -> Result<(), PushError> {
		self.command_tx.send(command).await.map_err(|_| PushError::ActorUnavailable)
	}

	pub async fn join(&self, group: GroupKey) -> Result<(), PushError> {
		self.send(ConnectionCommand::Join(group)).await
	}

	pub async fn leave(&self, group: GroupKey) -> Result<(), PushError> {
		self.send(ConnectionCommand::Leave(group)).await
	}

	pub async fn deliver(&self, message: ServerMessage) -> Result<(), PushError> {
		self.send(ConnectionCommand::Deliver(message)).await
	}

	pub async fn record_activity(&self) -> Result<(), PushError> {
		self.send(ConnectionCommand::RecordActivity).await
	}

	pub async fn check_stale(&self, timeout: Duration) -> Result<bool, PushError> {
		let (reply, rx) = oneshot::channel();
		self.send(ConnectionCommand::CheckStale { timeout, reply }).await?;
		rx.await.map_err(|_| PushError::ActorUnavailable)
	}

	pub async fn groups(&self) -> Result<HashSet<GroupKey>, PushError> {
		let (reply, rx) = oneshot::channel();
		self.send(ConnectionCommand::Groups { reply }).await?;
		rx.await.map_err(|_| PushError::ActorUnavailable)
	}

	/// Cancels the engine task; does not await its completion so callers on
	/// a hot disconnect path never block on it.
	pub fn shutdown(&self) {
		self.cancel_token.cancel();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn join_is_reflected_in_groups() {
		let root = CancellationToken::new();
		let (handle, _outbound_rx, _task) = ConnectionHandle::spawn(ConnectionId::new(), 16, &root);
		let group = GroupKey::User {
			tenant_id: waitroom_core::ids::TenantId::new(),
			user_identifier: "alice".to_string(),
		};
		handle.join(group.clone()).await.unwrap();
		let groups = handle.groups().await.unwrap();
		assert!(groups.contains(&group));
		handle.shutdown();
	}

	#[tokio::test]
	async fn delivered_messages_reach_the_outbound_channel() {
		let root = CancellationToken::new();
		let (handle, mut outbound_rx, _task) = ConnectionHandle::spawn(ConnectionId::new(), 16, &root);
		handle
			.deliver(ServerMessage::JoinedQueue {
				queue_id: waitroom_core::ids::QueueId::new(),
			})
			.await
			.unwrap();
		let received = outbound_rx.recv().await.unwrap();
		assert!(matches!(received, ServerMessage::JoinedQueue { .. }));
		handle.shutdown();
	}

	#[tokio::test]
	async fn stale_after_timeout_elapses() {
		let root = CancellationToken::new();
		let (handle, _outbound_rx, _task) = ConnectionHandle::spawn(ConnectionId::new(), 16, &root);
		tokio::time::sleep(Duration::from_millis(20)).await;
		let stale = handle.check_stale(Duration::from_millis(5)).await.unwrap();
		assert!(stale);
		handle.shutdown();
	}
}
