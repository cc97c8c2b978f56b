//! Queue CRUD, activation, schedule, and availability handlers.

use crate::http::error::Error;
use crate::http::schema::{AvailabilityQuery, AvailabilityResponse, CreateQueueRequest, QueueDto, UpdateQueueRequest};
use crate::http::state::AppState;
use crate::http::tenant::TenantContext;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use waitroom_core::ids::QueueId;
use waitroom_core::model::{Queue, Schedule};
use waitroom_core::schedule::is_active;
use waitroom_events::{Event, EventKind};

fn owned_queue(app: &AppState, tenant_id: waitroom_core::ids::TenantId, queue_id: QueueId) -> Result<Queue, Error> {
	app.queues.get(queue_id).filter(|q| q.tenant_id == tenant_id).ok_or(Error::NotFound)
}

pub async fn list(State(app): State<AppState>, TenantContext(tenant): TenantContext) -> Json<Vec<QueueDto>> {
	Json(app.queues.list_for_tenant(tenant.id).into_iter().map(QueueDto::from).collect())
}

pub async fn create(State(app): State<AppState>, TenantContext(tenant): TenantContext, Json(req): Json<CreateQueueRequest>) -> Result<(StatusCode, Json<QueueDto>), Error> {
	req.validate()?;
	let queue = Queue {
		id: QueueId::new(),
		tenant_id: tenant.id,
		name: req.name,
		description: req.description,
		active: true,
		max_concurrent_users: req.max_concurrent_users,
		release_rate_per_minute: req.release_rate_per_minute,
		tick_interval_ms: app.config.engine.tick_interval.as_millis() as u64,
		last_release_at: None,
		schedule: None,
		created_at: Utc::now(),
	};
	app.queues.insert(queue.clone());
	app.controllers.spawn(&queue);
	app.bus.publish(Event::new(tenant.id, EventKind::QueueCreated).with_queue(queue.id));
	Ok((StatusCode::CREATED, Json(queue.into())))
}

pub async fn get(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path(queue_id): Path<QueueId>) -> Result<Json<QueueDto>, Error> {
	let queue = owned_queue(&app, tenant.id, queue_id)?;
	Ok(Json(queue.into()))
}

pub async fn update(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path(queue_id): Path<QueueId>, Json(req): Json<UpdateQueueRequest>) -> Result<Json<QueueDto>, Error> {
	req.validate()?;
	owned_queue(&app, tenant.id, queue_id)?;

	let updated = app.queues.update(queue_id, |queue| {
		if let Some(name) = req.name.clone() {
			queue.name = name;
		}
		if req.description.is_some() {
			queue.description = req.description.clone();
		}
		if let Some(cap) = req.max_concurrent_users {
			queue.max_concurrent_users = cap;
		}
		if let Some(rate) = req.release_rate_per_minute {
			queue.release_rate_per_minute = rate;
		}
	})?;

	if let Some(handle) = app.controllers.get(queue_id) {
		if let Some(cap) = req.max_concurrent_users {
			handle.set_cap(cap)?;
		}
		if let Some(rate) = req.release_rate_per_minute {
			handle.set_release_rate(rate)?;
		}
	}
	Ok(Json(updated.into()))
}

pub async fn delete(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path(queue_id): Path<QueueId>) -> Result<StatusCode, Error> {
	owned_queue(&app, tenant.id, queue_id)?;
	app.controllers.remove(queue_id).await;
	app.queues.remove(queue_id);
	Ok(StatusCode::NO_CONTENT)
}

pub async fn activate(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path(queue_id): Path<QueueId>) -> Result<Json<QueueDto>, Error> {
	let queue = owned_queue(&app, tenant.id, queue_id)?;
	app.queues.set_active(queue_id, true)?;
	match app.controllers.get(queue_id) {
		Some(handle) => handle.start()?,
		None => {
			app.controllers.spawn(&Queue { active: true, ..queue });
		}
	}
	app.bus.publish(Event::new(tenant.id, EventKind::QueueActivated).with_queue(queue_id));
	Ok(Json(owned_queue(&app, tenant.id, queue_id)?.into()))
}

pub async fn deactivate(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path(queue_id): Path<QueueId>) -> Result<Json<QueueDto>, Error> {
	owned_queue(&app, tenant.id, queue_id)?;
	app.queues.set_active(queue_id, false)?;
	if let Some(handle) = app.controllers.get(queue_id) {
		handle.stop()?;
	}
	app.bus.publish(Event::new(tenant.id, EventKind::QueueDeactivated).with_queue(queue_id));
	Ok(Json(owned_queue(&app, tenant.id, queue_id)?.into()))
}

pub async fn set_schedule(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path(queue_id): Path<QueueId>, Json(schedule): Json<Schedule>) -> Result<Json<QueueDto>, Error> {
	owned_queue(&app, tenant.id, queue_id)?;
	app.queues.set_schedule(queue_id, Some(schedule.clone()))?;
	if let Some(handle) = app.controllers.get(queue_id) {
		handle.set_schedule(Some(schedule))?;
	}
	app.bus.publish(Event::new(tenant.id, EventKind::QueueScheduleChanged).with_queue(queue_id));
	Ok(Json(owned_queue(&app, tenant.id, queue_id)?.into()))
}

pub async fn availability(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path(queue_id): Path<QueueId>, Query(query): Query<AvailabilityQuery>) -> Result<Json<AvailabilityResponse>, Error> {
	let queue = owned_queue(&app, tenant.id, queue_id)?;
	let check_time = query.check_time.unwrap_or_else(Utc::now);
	let schedule_active = queue.schedule.as_ref().map_or(true, |schedule| is_active(schedule, check_time));
	Ok(Json(AvailabilityResponse {
		active: queue.active && schedule_active,
		queue_active: queue.active,
		schedule_active,
		check_time,
	}))
}
