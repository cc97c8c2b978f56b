use super::{ControllerCommand, ControllerEvent, ControllerState, EventPublisher, SessionStore};
use crate::ids::QueueId;
use crate::model::{Schedule, SessionStatus};
use crate::waiting_set::WaitingSet;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

struct EngineState {
	queue_id: QueueId,
	cap: u32,
	release_rate_per_minute: u32,
	schedule: Option<Schedule>,
	waiting: WaitingSet,
	running: bool,
	/// Moment the accrual window was last reset. Advanced every tick,
	/// whether or not it emitted.
	last_release_at: DateTime<Utc>,
	/// Whole and fractional exit tokens accrued since `last_release_at`,
	/// spent down as releases are emitted. A minute-bounded token bucket,
	/// equivalent to recomputing the formula from scratch every tick.
	accrued_budget: f64,
}

impl EngineState {
	/// `budget(now) = floor(ReleaseRatePerMinute * (now - LastReleaseAt) / 60s)`,
	/// implemented as a running fractional balance so sub-token elapsed time
	/// is never lost between ticks.
	fn accrue(&mut self, now: DateTime<Utc>) {
		let elapsed_ms = now.signed_duration_since(self.last_release_at).num_milliseconds().max(0) as f64;
		self.accrued_budget += f64::from(self.release_rate_per_minute) * elapsed_ms / 60_000.0;
		self.last_release_at = now;
	}
}

/// Owns the per-queue waiting set and drives the tick loop. Spawned by
/// [`super::ControllerHandle::spawn`]; never constructed or driven directly
/// by callers outside this crate.
pub struct ControllerEngine<S, P> {
	queue_id: QueueId,
	cap: u32,
	release_rate_per_minute: u32,
	tick_interval: std::time::Duration,
	schedule: Option<Schedule>,
	store: Arc<S>,
	publisher: Arc<P>,
}

impl<S, P> ControllerEngine<S, P>
where
	S: SessionStore + 'static,
	P: EventPublisher + 'static,
{
	#[must_use]
	pub fn new(queue_id: QueueId, cap: u32, release_rate_per_minute: u32, tick_interval: std::time::Duration, schedule: Option<Schedule>, store: Arc<S>, publisher: Arc<P>) -> Self {
		Self {
			queue_id,
			cap,
			release_rate_per_minute,
			tick_interval,
			schedule,
			store,
			publisher,
		}
	}

	pub async fn run(self, mut command_rx: tokio::sync::mpsc::UnboundedReceiver<ControllerCommand>, state_tx: watch::Sender<ControllerState>, cancel_token: CancellationToken) {
		let mut state = EngineState {
			queue_id: self.queue_id,
			cap: self.cap,
			release_rate_per_minute: self.release_rate_per_minute,
			schedule: self.schedule,
			waiting: WaitingSet::new(),
			running: false,
			last_release_at: Utc::now(),
			accrued_budget: 0.0,
		};
		let mut ticker = interval(self.tick_interval);

		info!(queue_id = %self.queue_id, "controller engine starting");

		loop {
			tokio::select! {
				_ = ticker.tick() => {
					Self::handle_tick(&mut state, &self.store, &self.publisher, &state_tx).await;
				}
				Some(command) = command_rx.recv() => {
					Self::handle_command(&mut state, &self.store, &self.publisher, &state_tx, command).await;
				}
				() = cancel_token.cancelled() => {
					info!(queue_id = %self.queue_id, "controller engine cancelled");
					break;
				}
			}
		}

		info!(queue_id = %self.queue_id, "controller engine stopped");
	}

	async fn handle_tick(state: &mut EngineState, store: &Arc<S>, publisher: &Arc<P>, state_tx: &watch::Sender<ControllerState>) {
		if !state.running {
			return;
		}

		let now = Utc::now();
		let active = state.schedule.as_ref().map_or(true, |s| crate::schedule::is_active(s, now));
		if !active {
			// No budget accrues while closed, so the queue cannot discharge
			// a backlog the instant it reopens.
			state.last_release_at = now;
			state.accrued_budget = 0.0;
			state_tx.send_replace(ControllerState::Suspended);
			return;
		}
		state_tx.send_replace(ControllerState::Running);

		state.accrue(now);

		let serving = match store.count_serving(state.queue_id).await {
			Ok(n) => n,
			Err(err) if err.is_structural() => {
				Self::stop_on_structural_error(state, state_tx, &err);
				return;
			}
			Err(err) => {
				warn!(queue_id = %state.queue_id, error = %err, "failed to read serving count, retrying next tick");
				return;
			}
		};
		let capacity = state.cap.saturating_sub(serving);
		let budget = (state.accrued_budget.floor().max(0.0) as u32).min(capacity) as usize;
		if budget == 0 {
			return;
		}

		let candidates = state.waiting.peek(budget);
		if candidates.is_empty() {
			return;
		}
		let ids: Vec<_> = candidates.iter().map(|e| e.session_id).collect();

		match store.bulk_transition(&ids, SessionStatus::Serving).await {
			Ok(served) => {
				for id in &served {
					state.waiting.remove(*id);
					publisher.publish(ControllerEvent::UserServed {
						queue_id: state.queue_id,
						session_id: *id,
					});
				}
				state.accrued_budget -= served.len() as f64;
				debug!(queue_id = %state.queue_id, count = served.len(), "admitted sessions into serving");
			}
			Err(err) if err.is_structural() => {
				Self::stop_on_structural_error(state, state_tx, &err);
			}
			Err(err) => {
				warn!(queue_id = %state.queue_id, error = %err, "bulk transition failed, candidates remain queued for next tick");
			}
		}
	}

	/// Halts the tick loop on a structural store failure (e.g. the queue's
	/// backing rows are gone): further ticks and commands are no-ops until
	/// an explicit `Stop`/`Start` cycle. Already-served or already-released
	/// sessions are not rolled back.
	fn stop_on_structural_error(state: &mut EngineState, state_tx: &watch::Sender<ControllerState>, err: &crate::error::EngineError) {
		error!(queue_id = %state.queue_id, error = %err, "structural store error, stopping controller");
		state.running = false;
		state_tx.send_replace(ControllerState::Failed);
	}

	async fn handle_command(state: &mut EngineState, store: &Arc<S>, publisher: &Arc<P>, state_tx: &watch::Sender<ControllerState>, command: ControllerCommand) {
		match command {
			ControllerCommand::Start => {
				state.running = true;
				state.last_release_at = Utc::now();
				state_tx.send_replace(ControllerState::Running);
				info!(queue_id = %state.queue_id, "controller started");
			}
			ControllerCommand::Stop => {
				state.running = false;
				state_tx.send_replace(ControllerState::Stopped);
				info!(queue_id = %state.queue_id, "controller stopped");
			}
			ControllerCommand::Enqueue { entry, user_identifier } => {
				state.waiting.insert(entry, &user_identifier);
			}
			ControllerCommand::Drop { session_id, reply } => {
				let removed = state.waiting.remove(session_id).is_some();
				if removed {
					publisher.publish(ControllerEvent::UserDropped {
						queue_id: state.queue_id,
						session_id,
					});
				}
				let _ = reply.send(removed);
			}
			ControllerCommand::ManualRelease { session_id, reply } => {
				// Additive to the automatic budget: does not touch
				// `accrued_budget`.
				let result = if state.waiting.remove(session_id).is_some() {
					match store.bulk_transition(&[session_id], SessionStatus::Serving).await {
						Ok(_) => {
							publisher.publish(ControllerEvent::UserServed {
								queue_id: state.queue_id,
								session_id,
							});
							Ok(())
						}
						Err(err) => {
							if err.is_structural() {
								Self::stop_on_structural_error(state, state_tx, &err);
							}
							Err(err)
						}
					}
				} else {
					Err(crate::error::EngineError::SessionNotFound(session_id))
				};
				let _ = reply.send(result);
			}
			ControllerCommand::Complete { session_id, reply } => {
				let result = match store.bulk_transition(&[session_id], SessionStatus::Released).await {
					Ok(changed) if changed.contains(&session_id) => {
						publisher.publish(ControllerEvent::UserReleased {
							queue_id: state.queue_id,
							session_id,
						});
						Ok(())
					}
					Ok(_) => Err(crate::error::EngineError::SessionNotFound(session_id)),
					Err(err) => {
						if err.is_structural() {
							Self::stop_on_structural_error(state, state_tx, &err);
						}
						Err(err)
					}
				};
				let _ = reply.send(result);
			}
			ControllerCommand::SetCap(cap) => state.cap = cap,
			ControllerCommand::SetReleaseRate(rate) => state.release_rate_per_minute = rate,
			ControllerCommand::SetSchedule(schedule) => state.schedule = schedule,
			ControllerCommand::ReleaseN { count, reply } => {
				let serving = match store.count_serving(state.queue_id).await {
					Ok(n) => n,
					Err(err) => {
						if err.is_structural() {
							Self::stop_on_structural_error(state, state_tx, &err);
						}
						let _ = reply.send(Err(err));
						return;
					}
				};
				let capacity = state.cap.saturating_sub(serving) as usize;
				let n = count.min(capacity).min(state.waiting.size());
				let candidates = state.waiting.peek(n);
				let ids: Vec<_> = candidates.iter().map(|e| e.session_id).collect();
				if ids.is_empty() {
					let _ = reply.send(Ok(Vec::new()));
					return;
				}
				match store.bulk_transition(&ids, SessionStatus::Serving).await {
					Ok(served) => {
						for id in &served {
							state.waiting.remove(*id);
							publisher.publish(ControllerEvent::UserServed {
								queue_id: state.queue_id,
								session_id: *id,
							});
						}
						let _ = reply.send(Ok(served));
					}
					Err(err) => {
						if err.is_structural() {
							Self::stop_on_structural_error(state, state_tx, &err);
						}
						let _ = reply.send(Err(err));
					}
				}
			}
			ControllerCommand::Reprioritize { session_id, priority } => {
				state.waiting.update_priority(session_id, priority);
			}
			ControllerCommand::PositionOf { session_id, reply } => {
				let _ = reply.send(state.waiting.position_of(session_id));
			}
			ControllerCommand::Peek { n, reply } => {
				let _ = reply.send(state.waiting.peek(n));
			}
			ControllerCommand::Size { reply } => {
				let _ = reply.send(state.waiting.size());
			}
			ControllerCommand::GetState { reply } => {
				let _ = reply.send(*state_tx.borrow());
			}
		}
	}
}
