//! Session enqueue/release/lookup/drop/complete handlers.

use crate::http::error::Error;
use crate::http::schema::{EnqueueRequest, ReleaseRequest, ReleaseResponse, UserSessionDto};
use crate::http::state::AppState;
use crate::http::tenant::TenantContext;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use waitroom_core::ids::QueueId;
use waitroom_core::model::{SessionStatus, UserSession, WaitingEntry};
use waitroom_core::schedule::is_active;
use waitroom_events::{Event, EventKind};
use waitroom_store::SessionStore;

async fn waiting_position(app: &AppState, queue_id: QueueId, session: &UserSession) -> Result<usize, Error> {
	if session.status != SessionStatus::Waiting {
		return Ok(0);
	}
	if let Some(cached) = app.positions.get(queue_id, &session.user_identifier) {
		return Ok(cached);
	}
	let Some(handle) = app.controllers.get(queue_id) else {
		return Ok(0);
	};
	let position = handle.position_of(session.id).await?.map_or(0, |p| p + 1);
	app.positions.set(queue_id, &session.user_identifier, position);
	Ok(position)
}

pub async fn enqueue(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path(queue_id): Path<QueueId>, Json(req): Json<EnqueueRequest>) -> Result<(StatusCode, Json<UserSessionDto>), Error> {
	req.validate()?;
	let queue = app.queues.get(queue_id).filter(|q| q.tenant_id == tenant.id).ok_or(Error::NotFound)?;

	let now = Utc::now();
	let schedule_active = queue.schedule.as_ref().map_or(true, |schedule| is_active(schedule, now));
	if !queue.active {
		return Err(Error::ScheduleClosed("queue is not active".to_string()));
	}
	if !schedule_active {
		return Err(Error::ScheduleClosed("queue is outside its scheduled hours".to_string()));
	}

	let handle = app.controllers.get(queue_id).ok_or_else(|| Error::Internal(anyhow::anyhow!("controller missing for active queue {queue_id}")))?;

	let session = UserSession {
		id: waitroom_core::ids::SessionId::new(),
		tenant_id: tenant.id,
		queue_id,
		user_identifier: req.user_identifier.clone(),
		metadata: req.metadata,
		priority: req.priority,
		status: SessionStatus::Waiting,
		enqueued_at: now,
		served_at: None,
		released_at: None,
		position: 0,
	};

	app.store.add(session.clone()).await?;
	handle.enqueue(WaitingEntry::from_session(&session), session.user_identifier.clone())?;
	app.positions.invalidate_queue(queue_id);

	let position = waiting_position(&app, queue_id, &session).await?;

	app.bus.publish(Event::new(tenant.id, EventKind::SessionEnqueued).with_queue(queue_id).with_session(session.id).with_user(&session.user_identifier));
	app.bus
		.publish(Event::new(tenant.id, EventKind::SessionPositionChanged { position }).with_queue(queue_id).with_session(session.id).with_user(&session.user_identifier));

	Ok((StatusCode::CREATED, Json(UserSessionDto::from_session(session, position))))
}

pub async fn release(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path(queue_id): Path<QueueId>, Json(req): Json<ReleaseRequest>) -> Result<Json<ReleaseResponse>, Error> {
	app.queues.get(queue_id).filter(|q| q.tenant_id == tenant.id).ok_or(Error::NotFound)?;
	let handle = app.controllers.get(queue_id).ok_or(Error::NotFound)?;

	let released = handle.release_n(req.count).await?;
	app.positions.invalidate_queue(queue_id);
	for session_id in &released {
		app.bus.publish(Event::new(tenant.id, EventKind::SessionManuallyReleased).with_queue(queue_id).with_session(*session_id));
	}

	Ok(Json(ReleaseResponse {
		released_count: released.len(),
		released_session_ids: released,
	}))
}

pub async fn get_user(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path((queue_id, user_identifier)): Path<(QueueId, String)>) -> Result<Json<UserSessionDto>, Error> {
	app.queues.get(queue_id).filter(|q| q.tenant_id == tenant.id).ok_or(Error::NotFound)?;
	let session = app.store.get_by_user(queue_id, &user_identifier).await?.ok_or(Error::NotFound)?;
	let position = waiting_position(&app, queue_id, &session).await?;
	Ok(Json(UserSessionDto::from_session(session, position)))
}

pub async fn drop_user(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path((queue_id, user_identifier)): Path<(QueueId, String)>) -> Result<StatusCode, Error> {
	app.queues.get(queue_id).filter(|q| q.tenant_id == tenant.id).ok_or(Error::NotFound)?;
	let session = app.store.get_by_user(queue_id, &user_identifier).await?.ok_or(Error::NotFound)?;
	if session.status != SessionStatus::Waiting {
		return Err(Error::NotFound);
	}

	if let Some(handle) = app.controllers.get(queue_id) {
		handle.drop_session(session.id).await?;
	}
	app.store.transition(session.id, SessionStatus::Dropped).await?;
	app.positions.invalidate_queue(queue_id);

	Ok(StatusCode::NO_CONTENT)
}

/// Marks a `Serving` session as finished, transitioning it to `Released`
/// and freeing the cap slot it held so the controller can admit another
/// waiting session on its next tick.
pub async fn complete_user(State(app): State<AppState>, TenantContext(tenant): TenantContext, Path((queue_id, user_identifier)): Path<(QueueId, String)>) -> Result<StatusCode, Error> {
	app.queues.get(queue_id).filter(|q| q.tenant_id == tenant.id).ok_or(Error::NotFound)?;
	let session = app.store.get_by_user(queue_id, &user_identifier).await?.ok_or(Error::NotFound)?;
	if session.status != SessionStatus::Serving {
		return Err(Error::Conflict("session is not currently serving".to_string()));
	}
	let handle = app.controllers.get(queue_id).ok_or(Error::NotFound)?;
	handle.complete(session.id).await?;
	app.positions.invalidate_queue(queue_id);

	Ok(StatusCode::NO_CONTENT)
}
