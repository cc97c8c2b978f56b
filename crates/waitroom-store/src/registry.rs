//! In-process tenant/queue registries backing the HTTP surface. Tenant and
//! user account management proper (signup, auth) remain external
//! collaborators; this only persists the `Tenant`/`Queue` rows the engine
//! and HTTP layer need to resolve requests against.

use crate::error::StoreError;
use dashmap::DashMap;
use waitroom_core::ids::{QueueId, TenantId};
use waitroom_core::model::{Queue, Schedule, Tenant};

#[derive(Default)]
pub struct TenantRegistry {
	by_id: DashMap<TenantId, Tenant>,
	by_key: DashMap<String, TenantId>,
	by_domain: DashMap<String, TenantId>,
}

impl TenantRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, tenant: Tenant) {
		self.by_key.insert(tenant.tenant_key.clone(), tenant.id);
		if let Some(domain) = &tenant.domain {
			self.by_domain.insert(domain.clone(), tenant.id);
		}
		self.by_id.insert(tenant.id, tenant);
	}

	#[must_use]
	pub fn get(&self, id: TenantId) -> Option<Tenant> {
		self.by_id.get(&id).map(|e| e.clone())
	}

	/// First leg of tenant resolution: `X-Tenant-Key` lookup by api-key.
	#[must_use]
	pub fn get_by_key(&self, tenant_key: &str) -> Option<Tenant> {
		let id = *self.by_key.get(tenant_key)?;
		self.get(id)
	}

	/// Second leg: request host resolved by domain.
	#[must_use]
	pub fn get_by_domain(&self, domain: &str) -> Option<Tenant> {
		let id = *self.by_domain.get(domain)?;
		self.get(id)
	}
}

#[derive(Default)]
pub struct QueueRegistry {
	queues: DashMap<QueueId, Queue>,
}

impl QueueRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, queue: Queue) {
		self.queues.insert(queue.id, queue);
	}

	#[must_use]
	pub fn get(&self, id: QueueId) -> Option<Queue> {
		self.queues.get(&id).map(|e| e.clone())
	}

	pub fn remove(&self, id: QueueId) -> Option<Queue> {
		self.queues.remove(&id).map(|(_, q)| q)
	}

	pub fn set_active(&self, id: QueueId, active: bool) -> Result<(), StoreError> {
		let mut entry = self.queues.get_mut(&id).ok_or(StoreError::QueueNotFound(id))?;
		entry.active = active;
		Ok(())
	}

	pub fn set_schedule(&self, id: QueueId, schedule: Option<Schedule>) -> Result<(), StoreError> {
		let mut entry = self.queues.get_mut(&id).ok_or(StoreError::QueueNotFound(id))?;
		entry.schedule = schedule;
		Ok(())
	}

	/// Applies `update` in place. Field bounds are the caller's
	/// responsibility, the same as on `insert` — this registry only owns
	/// storage, not validation.
	pub fn update<F>(&self, id: QueueId, update: F) -> Result<Queue, StoreError>
	where
		F: FnOnce(&mut Queue),
	{
		let mut entry = self.queues.get_mut(&id).ok_or(StoreError::QueueNotFound(id))?;
		update(&mut entry);
		Ok(entry.clone())
	}

	#[must_use]
	pub fn list_for_tenant(&self, tenant_id: TenantId) -> Vec<Queue> {
		self.queues.iter().filter(|e| e.tenant_id == tenant_id).map(|e| e.clone()).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	fn tenant() -> Tenant {
		Tenant {
			id: TenantId::new(),
			name: "Acme".to_string(),
			tenant_key: "acme".to_string(),
			domain: Some("acme.example.com".to_string()),
			active: true,
			created_at: Utc::now(),
		}
	}

	fn queue() -> Queue {
		Queue {
			id: QueueId::new(),
			tenant_id: TenantId::new(),
			name: "main".to_string(),
			description: None,
			active: false,
			max_concurrent_users: 10,
			release_rate_per_minute: 2,
			tick_interval_ms: 1000,
			last_release_at: None,
			schedule: None,
			created_at: Utc::now(),
		}
	}

	#[test]
	fn resolves_tenant_by_key() {
		let registry = TenantRegistry::new();
		let t = tenant();
		registry.insert(t.clone());
		assert_eq!(registry.get_by_key("acme").unwrap().id, t.id);
	}

	#[test]
	fn resolves_tenant_by_domain_when_key_is_absent() {
		let registry = TenantRegistry::new();
		let t = tenant();
		registry.insert(t.clone());
		assert_eq!(registry.get_by_domain("acme.example.com").unwrap().id, t.id);
		assert!(registry.get_by_domain("nobody.example.com").is_none());
	}

	#[test]
	fn queue_activation_toggles() {
		let registry = QueueRegistry::new();
		let q = queue();
		registry.insert(q.clone());
		registry.set_active(q.id, true).unwrap();
		assert!(registry.get(q.id).unwrap().active);
	}

	#[test]
	fn update_mutates_in_place_and_returns_the_new_value() {
		let registry = QueueRegistry::new();
		let q = queue();
		registry.insert(q.clone());
		let updated = registry.update(q.id, |queue| queue.max_concurrent_users = 42).unwrap();
		assert_eq!(updated.max_concurrent_users, 42);
		assert_eq!(registry.get(q.id).unwrap().max_concurrent_users, 42);
	}

	#[test]
	fn remove_drops_the_queue() {
		let registry = QueueRegistry::new();
		let q = queue();
		registry.insert(q.clone());
		assert!(registry.remove(q.id).is_some());
		assert!(registry.get(q.id).is_none());
	}
}
