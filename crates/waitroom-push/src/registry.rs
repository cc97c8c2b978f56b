//! Connection registry: tracks every live [`ConnectionHandle`] and a
//! reverse group index so an event needs one lookup per group, not a scan
//! of every connection. `DashMap`-keyed connection store, generalized to a
//! structured [`GroupKey`] rather than an ad-hoc string key.

use crate::connection::ConnectionHandle;
use crate::error::PushError;
use crate::group::GroupKey;
use crate::ids::ConnectionId;
use crate::messages::ServerMessage;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use waitroom_core::ids::TenantId;
use waitroom_push_guard::ConnectionGuard;

#[derive(Debug, Clone)]
pub struct PushRegistryConfig {
	/// Global+per-tenant admission ceiling, guarded by `waitroom-push-guard`
	/// (distinct from the domain's `MaxConcurrentUsers`).
	pub max_connections_per_tenant: usize,
	pub max_connections_per_client: usize,
	pub max_queue_per_client: usize,
	pub outbound_buffer: usize,
	pub stale_timeout: Duration,
}

impl Default for PushRegistryConfig {
	fn default() -> Self {
		Self {
			max_connections_per_tenant: 10_000,
			max_connections_per_client: 5,
			max_queue_per_client: 10,
			outbound_buffer: 64,
			stale_timeout: Duration::from_secs(60),
		}
	}
}

pub struct PushRegistry {
	config: PushRegistryConfig,
	connections: DashMap<ConnectionId, ConnectionHandle>,
	groups: DashMap<GroupKey, DashSet<ConnectionId>>,
	tenant_guards: DashMap<TenantId, ConnectionGuard>,
	root_token: CancellationToken,
}

impl PushRegistry {
	#[must_use]
	pub fn new(config: PushRegistryConfig, root_token: CancellationToken) -> Self {
		Self {
			config,
			connections: DashMap::new(),
			groups: DashMap::new(),
			tenant_guards: DashMap::new(),
			root_token,
		}
	}

	fn guard_for(&self, tenant_id: TenantId) -> ConnectionGuard {
		self
			.tenant_guards
			.entry(tenant_id)
			.or_insert_with(|| ConnectionGuard::with_limits(self.config.max_connections_per_tenant, self.config.max_connections_per_client, self.config.max_queue_per_client))
			.clone()
	}

	/// Admits a new connection for `(tenant_id, user_identifier)`, spawning
	/// its actor. Returns the handle, the outbound receiver the websocket
	/// write loop drains, and a permit whose drop releases the tenant's
	/// connection-guard slot.
	pub async fn register(&self, tenant_id: TenantId, user_identifier: &str) -> Result<(ConnectionHandle, tokio::sync::mpsc::Receiver<ServerMessage>, waitroom_push_guard::ConnectionPermit), PushError> {
		let guard = self.guard_for(tenant_id);
		let permit = guard.acquire(user_identifier.to_string()).await.map_err(|_| PushError::ActorUnavailable)?;

		let connection_id = ConnectionId::new();
		let (handle, outbound_rx, _task) = ConnectionHandle::spawn(connection_id, self.config.outbound_buffer, &self.root_token);
		self.connections.insert(connection_id, handle.clone());
		Ok((handle, outbound_rx, permit))
	}

	/// Removes a connection from every group it belonged to and drops its
	/// handle. Safe to call more than once.
	pub async fn unregister(&self, connection_id: ConnectionId) {
		if let Some((_, handle)) = self.connections.remove(&connection_id) {
			if let Ok(member_of) = handle.groups().await {
				for group in member_of {
					if let Some(members) = self.groups.get(&group) {
						members.remove(&connection_id);
					}
				}
			}
			handle.shutdown();
		}
	}

	/// Joins `connection_id` to `group`, requiring a valid tenant context —
	/// callers resolve the connection's tenant before calling this, never
	/// trusting client-supplied tenant ids.
	pub async fn join(&self, connection_id: ConnectionId, group: GroupKey) -> Result<(), PushError> {
		let handle = self.connections.get(&connection_id).ok_or(PushError::NotFound(connection_id))?.clone();
		handle.join(group.clone()).await?;
		self.groups.entry(group).or_default().insert(connection_id);
		Ok(())
	}

	pub async fn leave(&self, connection_id: ConnectionId, group: &GroupKey) -> Result<(), PushError> {
		let handle = self.connections.get(&connection_id).ok_or(PushError::NotFound(connection_id))?.clone();
		handle.leave(group.clone()).await?;
		if let Some(members) = self.groups.get(group) {
			members.remove(&connection_id);
		}
		Ok(())
	}

	/// Delivers `message` to every connection subscribed to `group`, in the
	/// order the bus handed them to us.
	pub async fn broadcast(&self, group: &GroupKey, message: ServerMessage) {
		let Some(members) = self.groups.get(group) else {
			return;
		};
		for connection_id in members.iter() {
			if let Some(handle) = self.connections.get(&connection_id) {
				let _ = handle.deliver(message.clone()).await;
			}
		}
	}

	#[must_use]
	pub fn connection_count(&self) -> usize {
		self.connections.len()
	}

	#[must_use]
	pub fn group_member_count(&self, group: &GroupKey) -> usize {
		self.groups.get(group).map_or(0, |m| m.len())
	}

	/// Sweeps every connection for staleness, dropping ones past
	/// `stale_timeout`. Intended to be driven by a periodic task in the
	/// process entrypoint, analogous to the release controller's tick.
	pub async fn sweep_stale(self: &Arc<Self>) {
		let stale: Vec<ConnectionId> = {
			let mut found = Vec::new();
			for entry in &self.connections {
				if entry.value().check_stale(self.config.stale_timeout).await.unwrap_or(false) {
					found.push(*entry.key());
				}
			}
			found
		};
		for connection_id in stale {
			self.unregister(connection_id).await;
		}
	}
}
