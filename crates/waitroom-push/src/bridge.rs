//! Bridges the event bus into the push registry: one subscriber
//! task per process, mirroring [`waitroom_events::controller_adapter`]'s
//! "events in, narrow type out" seam but the other direction — bus events
//! in, [`ServerMessage`] deliveries out.

use crate::group::GroupKey;
use crate::messages::ServerMessage;
use crate::registry::PushRegistry;
use std::sync::Arc;
use waitroom_events::{EventKind, EventSubscriber};

/// Runs until the bus is closed or `cancel_token` fires. Spawned once at
/// process startup alongside the release controller ticks.
pub async fn run(registry: Arc<PushRegistry>, mut subscriber: EventSubscriber, cancel_token: tokio_util::sync::CancellationToken) {
	loop {
		tokio::select! {
			event = subscriber.recv() => {
				let Some(event) = event else { break };
				dispatch(&registry, event).await;
			}
			() = cancel_token.cancelled() => break,
		}
	}
}

async fn dispatch(registry: &Arc<PushRegistry>, event: waitroom_events::Event) {
	let tenant_id = event.tenant_id;

	if let Some(queue_id) = event.queue_id {
		let group = GroupKey::Queue { tenant_id, queue_id };
		if let Some(message) = queue_message(&event, queue_id) {
			registry.broadcast(&group, message).await;
		}
	}

	if let Some(user_identifier) = &event.user_identifier {
		let group = GroupKey::User {
			tenant_id,
			user_identifier: user_identifier.clone(),
		};
		if let Some(message) = user_message(&event, user_identifier) {
			registry.broadcast(&group, message).await;
		}
	}
}

fn queue_message(event: &waitroom_events::Event, queue_id: waitroom_core::ids::QueueId) -> Option<ServerMessage> {
	match &event.kind {
		EventKind::QueueActivated => Some(ServerMessage::QueueUpdated { queue_id, active: true }),
		EventKind::QueueDeactivated | EventKind::QueueSuspendedBySchedule => Some(ServerMessage::QueueUpdated { queue_id, active: false }),
		EventKind::SessionPositionChanged { position } => event.user_identifier.clone().map(|user_identifier| ServerMessage::PositionUpdated {
			queue_id,
			user_identifier,
			position: *position,
		}),
		EventKind::SessionReleased | EventKind::SessionManuallyReleased => event.session_id.map(|session_id| ServerMessage::UserReleased { queue_id, session_id }),
		_ => None,
	}
}

fn user_message(event: &waitroom_events::Event, user_identifier: &str) -> Option<ServerMessage> {
	let queue_id = event.queue_id?;
	let status = match &event.kind {
		EventKind::SessionEnqueued => "waiting",
		EventKind::SessionReleased | EventKind::SessionManuallyReleased => "released",
		EventKind::SessionDropped => "dropped",
		EventKind::SessionPositionChanged { .. } => return None,
		_ => return None,
	};
	Some(ServerMessage::UserUpdated {
		queue_id,
		user_identifier: user_identifier.to_string(),
		status: status.to_string(),
	})
}
