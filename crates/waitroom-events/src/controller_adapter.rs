//! Adapts the release controller's narrow [`waitroom_core::controller::ControllerEvent`]
//! into the bus's full envelope, the seam the design notes describe as
//! "events returned/emitted rather than entity-coupled": the controller
//! itself never constructs an `Event`, it only reports what happened.

use crate::bus::EventBus;
use crate::event::{Event, EventKind};
use waitroom_core::controller::{ControllerEvent, EventPublisher};
use waitroom_core::ids::TenantId;

pub struct BusPublisher {
	bus: std::sync::Arc<EventBus>,
	tenant_id: TenantId,
}

impl BusPublisher {
	#[must_use]
	pub const fn new(bus: std::sync::Arc<EventBus>, tenant_id: TenantId) -> Self {
		Self { bus, tenant_id }
	}
}

impl EventPublisher for BusPublisher {
	fn publish(&self, event: ControllerEvent) {
		let mapped = match event {
			ControllerEvent::UserServed { queue_id, session_id } => Event::new(self.tenant_id, EventKind::SessionServed).with_queue(queue_id).with_session(session_id),
			ControllerEvent::UserReleased { queue_id, session_id } => Event::new(self.tenant_id, EventKind::SessionReleased).with_queue(queue_id).with_session(session_id),
			ControllerEvent::UserDropped { queue_id, session_id } => Event::new(self.tenant_id, EventKind::SessionDropped).with_queue(queue_id).with_session(session_id),
			ControllerEvent::QueueSuspended { queue_id } => Event::new(self.tenant_id, EventKind::QueueSuspendedBySchedule).with_queue(queue_id),
			ControllerEvent::QueueResumed { queue_id } => Event::new(self.tenant_id, EventKind::QueueActivated).with_queue(queue_id),
		};
		self.bus.publish(mapped);
	}
}
