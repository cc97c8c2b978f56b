//! Owns one [`ControllerHandle`] per queue, spawned on queue creation and
//! torn down on deletion. The HTTP handlers never talk to a `ControllerEngine`
//! directly; every queue mutation that needs to reach the running engine
//! (cap/rate/schedule changes, activate/deactivate, manual release) goes
//! through here.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use waitroom_core::controller::ControllerHandle;
use waitroom_core::ids::QueueId;
use waitroom_core::model::Queue;
use waitroom_events::BusPublisher;
use waitroom_store::{ControllerStoreAdapter, InMemorySessionStore};

pub struct ControllerRegistry {
	handles: DashMap<QueueId, ControllerHandle>,
	store: Arc<InMemorySessionStore>,
	bus: Arc<waitroom_events::EventBus>,
	root_token: CancellationToken,
}

impl ControllerRegistry {
	#[must_use]
	pub fn new(store: Arc<InMemorySessionStore>, bus: Arc<waitroom_events::EventBus>, root_token: CancellationToken) -> Self {
		Self {
			handles: DashMap::new(),
			store,
			bus,
			root_token,
		}
	}

	/// Spawns a fresh engine for `queue`, starting it immediately if the
	/// queue is active. Replaces any prior handle for the same id without
	/// shutting down the old one first; callers are responsible for calling
	/// [`Self::remove`] before respawning a live queue.
	pub fn spawn(&self, queue: &Queue) -> ControllerHandle {
		let adapter = Arc::new(ControllerStoreAdapter::new(self.store.clone()));
		let publisher = Arc::new(BusPublisher::new(self.bus.clone(), queue.tenant_id));
		let handle = ControllerHandle::spawn(
			queue.id,
			queue.max_concurrent_users,
			queue.release_rate_per_minute,
			Duration::from_millis(queue.tick_interval_ms),
			queue.schedule.clone(),
			adapter,
			publisher,
			&self.root_token,
		);
		if queue.active {
			let _ = handle.start();
		}
		self.handles.insert(queue.id, handle.clone());
		handle
	}

	#[must_use]
	pub fn get(&self, id: QueueId) -> Option<ControllerHandle> {
		self.handles.get(&id).map(|e| e.clone())
	}

	/// Cancels and awaits the engine for `id`, if one is running.
	pub async fn remove(&self, id: QueueId) {
		if let Some((_, handle)) = self.handles.remove(&id) {
			handle.shutdown().await;
		}
	}
}
