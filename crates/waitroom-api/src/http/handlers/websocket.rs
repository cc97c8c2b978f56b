//! `/queuehub` push channel transport. Owns the actual socket;
//! delegates group membership and fan-out to [`waitroom_push::PushRegistry`].

use crate::http::state::AppState;
use crate::http::tenant::TenantContext;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use waitroom_push::{ClientMessage, GroupKey, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
	/// Identifies the caller for per-client connection admission and for
	/// `SubscribeToUserUpdates` on their own behalf. Connections that never
	/// supply one are admitted anonymously, under a synthetic identifier.
	pub user_identifier: Option<String>,
}

pub async fn upgrade(ws: WebSocketUpgrade, State(app): State<AppState>, TenantContext(tenant): TenantContext, Query(query): Query<ConnectQuery>) -> impl IntoResponse {
	let user_identifier = query.user_identifier.unwrap_or_else(|| format!("anon-{}", uuid::Uuid::new_v4()));
	ws.on_upgrade(move |socket| run_connection(socket, app, tenant.id, user_identifier))
}

async fn run_connection(socket: WebSocket, app: AppState, tenant_id: waitroom_core::ids::TenantId, user_identifier: String) {
	let (handle, mut outbound_rx, _permit) = match app.push.register(tenant_id, &user_identifier).await {
		Ok(registered) => registered,
		Err(err) => {
			tracing::warn!(%err, "rejected websocket connection");
			return;
		}
	};

	let (mut sink, mut stream) = socket.split();

	loop {
		tokio::select! {
			outbound = outbound_rx.recv() => {
				let Some(message) = outbound else { break };
				let Ok(text) = serde_json::to_string(&message) else { continue };
				if sink.send(Message::Text(text)).await.is_err() {
					break;
				}
			}
			inbound = stream.next() => {
				let Some(inbound) = inbound else { break };
				match inbound {
					Ok(Message::Text(text)) => handle_client_message(&app, &handle, tenant_id, &text).await,
					Ok(Message::Close(_)) => break,
					Ok(_) => {}
					Err(_) => break,
				}
			}
		}
	}

	app.push.unregister(handle.connection_id()).await;
}

async fn handle_client_message(app: &AppState, handle: &waitroom_push::ConnectionHandle, tenant_id: waitroom_core::ids::TenantId, text: &str) {
	let _ = handle.record_activity().await;

	let reply = match serde_json::from_str::<ClientMessage>(text) {
		Ok(ClientMessage::JoinQueueGroup { queue_id }) => {
			let group = GroupKey::Queue { tenant_id, queue_id };
			match app.push.join(handle.connection_id(), group).await {
				Ok(()) => ServerMessage::JoinedQueue { queue_id },
				Err(err) => ServerMessage::Error { message: err.to_string() },
			}
		}
		Ok(ClientMessage::LeaveQueueGroup { queue_id }) => {
			let group = GroupKey::Queue { tenant_id, queue_id };
			match app.push.leave(handle.connection_id(), &group).await {
				Ok(()) => ServerMessage::LeftQueue { queue_id },
				Err(err) => ServerMessage::Error { message: err.to_string() },
			}
		}
		Ok(ClientMessage::SubscribeToUserUpdates { user_identifier }) => {
			let group = GroupKey::User { tenant_id, user_identifier: user_identifier.clone() };
			match app.push.join(handle.connection_id(), group).await {
				Ok(()) => ServerMessage::SubscribedToUser { user_identifier },
				Err(err) => ServerMessage::Error { message: err.to_string() },
			}
		}
		Ok(ClientMessage::UnsubscribeFromUserUpdates { user_identifier }) => {
			let group = GroupKey::User { tenant_id, user_identifier: user_identifier.clone() };
			match app.push.leave(handle.connection_id(), &group).await {
				Ok(()) => ServerMessage::UnsubscribedFromUser { user_identifier },
				Err(err) => ServerMessage::Error { message: err.to_string() },
			}
		}
		Err(err) => ServerMessage::Error { message: format!("malformed message: {err}") },
	};

	let _ = handle.deliver(reply).await;
}
