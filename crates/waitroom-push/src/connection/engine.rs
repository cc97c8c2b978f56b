use super::command::ConnectionCommand;
use super::state::ConnectionLiveness;
use crate::ids::ConnectionId;
use crate::messages::ServerMessage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Owns one connection's liveness/subscription state and forwards
/// [`ServerMessage`]s onto the outbound channel the websocket handler reads
/// from. Spawned by [`super::ConnectionHandle::spawn`].
pub struct ConnectionEngine {
	connection_id: ConnectionId,
	outbound: mpsc::Sender<ServerMessage>,
}

impl ConnectionEngine {
	#[must_use]
	pub const fn new(connection_id: ConnectionId, outbound: mpsc::Sender<ServerMessage>) -> Self {
		Self { connection_id, outbound }
	}

	pub async fn run(self, mut commands: mpsc::Receiver<ConnectionCommand>, cancel_token: CancellationToken) {
		let mut state = ConnectionLiveness::new();
		info!(connection_id = %self.connection_id, "connection actor starting");

		loop {
			tokio::select! {
				Some(command) = commands.recv() => {
					if !self.handle_command(&mut state, command).await {
						break;
					}
				}
				() = cancel_token.cancelled() => {
					debug!(connection_id = %self.connection_id, "connection actor cancelled");
					break;
				}
			}
		}

		info!(connection_id = %self.connection_id, "connection actor stopped");
	}

	/// Returns `false` when the actor loop should exit.
	async fn handle_command(&self, state: &mut ConnectionLiveness, command: ConnectionCommand) -> bool {
		match command {
			ConnectionCommand::Join(group) => {
				state.groups.insert(group);
			}
			ConnectionCommand::Leave(group) => {
				state.groups.remove(&group);
			}
			ConnectionCommand::Deliver(message) => {
				// Best-effort: a full outbound buffer means a slow client,
				// and the bus's own drop-oldest policy already accounted
				// for that upstream.
				let _ = self.outbound.try_send(message);
			}
			ConnectionCommand::RecordActivity => {
				state.record_activity();
			}
			ConnectionCommand::CheckStale { timeout, reply } => {
				if state.should_be_stale(timeout) {
					state.is_stale = true;
				}
				let _ = reply.send(state.is_stale);
			}
			ConnectionCommand::Groups { reply } => {
				let _ = reply.send(state.groups.clone());
			}
			ConnectionCommand::Shutdown => return false,
		}
		true
	}
}
