use super::{ControllerCommand, ControllerEngine, ControllerState, EventPublisher, SessionStore};
use crate::error::EngineError;
use crate::ids::{QueueId, SessionId};
use crate::model::{Priority, Schedule, WaitingEntry};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cheap, clonable front for a running [`ControllerEngine`]. Every method
/// takes `&self`; all mutation happens inside the engine's task.
#[derive(Clone)]
pub struct ControllerHandle {
	command_tx: mpsc::UnboundedSender<ControllerCommand>,
	state_rx: watch::Receiver<ControllerState>,
	task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
	cancel_token: CancellationToken,
}

impl ControllerHandle {
	pub fn spawn<S, P>(
		queue_id: QueueId,
		cap: u32,
		release_rate_per_minute: u32,
		tick_interval: std::time::Duration,
		schedule: Option<Schedule>,
		store: Arc<S>,
		publisher: Arc<P>,
		parent_token: &CancellationToken,
	) -> Self
	where
		S: SessionStore + 'static,
		P: EventPublisher + 'static,
	{
		let cancel_token = parent_token.child_token();
		let (command_tx, command_rx) = mpsc::unbounded_channel();
		let (state_tx, state_rx) = watch::channel(ControllerState::Stopped);

		let engine = ControllerEngine::new(queue_id, cap, release_rate_per_minute, tick_interval, schedule, store, publisher);
		let task_handle = tokio::spawn(engine.run(command_rx, state_tx, cancel_token.clone()));

		Self {
			command_tx,
			state_rx,
			task_handle: Arc::new(Mutex::new(Some(task_handle))),
			cancel_token,
		}
	}

	fn send(&self, command: ControllerCommand) -> Result<(), EngineError> {
		self.command_tx.send(command).map_err(|_| EngineError::Internal("controller engine unavailable".to_string()))
	}

	pub fn start(&self) -> Result<(), EngineError> {
		self.send(ControllerCommand::Start)
	}

	pub fn stop(&self) -> Result<(), EngineError> {
		self.send(ControllerCommand::Stop)
	}

	pub fn enqueue(&self, entry: WaitingEntry, user_identifier: impl Into<String>) -> Result<(), EngineError> {
		self.send(ControllerCommand::Enqueue {
			entry,
			user_identifier: user_identifier.into(),
		})
	}

	pub async fn drop_session(&self, session_id: SessionId) -> Result<bool, EngineError> {
		let (reply, rx) = oneshot::channel();
		self.send(ControllerCommand::Drop { session_id, reply })?;
		rx.await.map_err(|_| EngineError::Internal("controller engine unavailable".to_string()))
	}

	pub async fn manual_release(&self, session_id: SessionId) -> Result<(), EngineError> {
		let (reply, rx) = oneshot::channel();
		self.send(ControllerCommand::ManualRelease { session_id, reply })?;
		rx.await.map_err(|_| EngineError::Internal("controller engine unavailable".to_string()))?
	}

	/// Signals that a `Serving` session's use of the protected resource has
	/// ended, transitioning it to `Released` and freeing its cap slot.
	pub async fn complete(&self, session_id: SessionId) -> Result<(), EngineError> {
		let (reply, rx) = oneshot::channel();
		self.send(ControllerCommand::Complete { session_id, reply })?;
		rx.await.map_err(|_| EngineError::Internal("controller engine unavailable".to_string()))?
	}

	pub fn set_cap(&self, cap: u32) -> Result<(), EngineError> {
		self.send(ControllerCommand::SetCap(cap))
	}

	pub fn set_release_rate(&self, rate: u32) -> Result<(), EngineError> {
		self.send(ControllerCommand::SetReleaseRate(rate))
	}

	pub fn set_schedule(&self, schedule: Option<Schedule>) -> Result<(), EngineError> {
		self.send(ControllerCommand::SetSchedule(schedule))
	}

	pub async fn release_n(&self, count: usize) -> Result<Vec<SessionId>, EngineError> {
		let (reply, rx) = oneshot::channel();
		self.send(ControllerCommand::ReleaseN { count, reply })?;
		rx.await.map_err(|_| EngineError::Internal("controller engine unavailable".to_string()))?
	}

	pub fn reprioritize(&self, session_id: SessionId, priority: Priority) -> Result<(), EngineError> {
		self.send(ControllerCommand::Reprioritize { session_id, priority })
	}

	pub async fn position_of(&self, session_id: SessionId) -> Result<Option<usize>, EngineError> {
		let (reply, rx) = oneshot::channel();
		self.send(ControllerCommand::PositionOf { session_id, reply })?;
		rx.await.map_err(|_| EngineError::Internal("controller engine unavailable".to_string()))
	}

	pub async fn peek(&self, n: usize) -> Result<Vec<WaitingEntry>, EngineError> {
		let (reply, rx) = oneshot::channel();
		self.send(ControllerCommand::Peek { n, reply })?;
		rx.await.map_err(|_| EngineError::Internal("controller engine unavailable".to_string()))
	}

	pub async fn size(&self) -> Result<usize, EngineError> {
		let (reply, rx) = oneshot::channel();
		self.send(ControllerCommand::Size { reply })?;
		rx.await.map_err(|_| EngineError::Internal("controller engine unavailable".to_string()))
	}

	#[must_use]
	pub fn current_state(&self) -> ControllerState {
		*self.state_rx.borrow()
	}

	#[must_use]
	pub fn subscribe_state(&self) -> watch::Receiver<ControllerState> {
		self.state_rx.clone()
	}

	/// Cancels the engine task and awaits its completion.
	pub async fn shutdown(&self) {
		self.cancel_token.cancel();
		if let Some(handle) = self.task_handle.lock().await.take() {
			let _ = handle.await;
		}
	}
}

impl Drop for ControllerHandle {
	fn drop(&mut self) {
		if Arc::strong_count(&self.task_handle) == 1 {
			self.cancel_token.cancel();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::EngineError as Err_;
	use crate::ids::SessionId;
	use crate::model::SessionStatus;
	use async_trait::async_trait;
	use chrono::Utc;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex as StdMutex;

	struct FakeStore {
		serving: AtomicUsize,
		transitioned: StdMutex<Vec<SessionId>>,
	}

	#[async_trait]
	impl SessionStore for FakeStore {
		async fn get(&self, _id: SessionId) -> Result<Option<crate::model::UserSession>, Err_> {
			Ok(None)
		}

		async fn bulk_transition(&self, ids: &[SessionId], _to: SessionStatus) -> Result<Vec<SessionId>, Err_> {
			self.transitioned.lock().unwrap().extend(ids.iter().copied());
			self.serving.fetch_add(ids.len(), Ordering::SeqCst);
			Ok(ids.to_vec())
		}

		async fn count_serving(&self, _queue_id: QueueId) -> Result<u32, Err_> {
			Ok(self.serving.load(Ordering::SeqCst) as u32)
		}
	}

	struct FakePublisher {
		events: StdMutex<Vec<super::super::ControllerEvent>>,
	}

	impl EventPublisher for FakePublisher {
		fn publish(&self, event: super::super::ControllerEvent) {
			self.events.lock().unwrap().push(event);
		}
	}

	#[tokio::test]
	async fn releases_up_to_budget_each_tick() {
		let store = Arc::new(FakeStore {
			serving: AtomicUsize::new(0),
			transitioned: StdMutex::new(Vec::new()),
		});
		let publisher = Arc::new(FakePublisher { events: StdMutex::new(Vec::new()) });
		let root = CancellationToken::new();
		let queue_id = QueueId::new();
		// A rate this high accrues well over 2 tokens within the first 5ms
		// tick; the concurrency cap (2), not the budget, is what should
		// bound how many get released.
		let handle = ControllerHandle::spawn(queue_id, 2, 60_000, std::time::Duration::from_millis(5), None, store.clone(), publisher, &root);

		handle.start().unwrap();
		for _ in 0..3 {
			let entry = WaitingEntry {
				priority: Priority::Normal,
				enqueued_at: Utc::now(),
				session_id: SessionId::new(),
			};
			handle.enqueue(entry, format!("user-{}", SessionId::new())).unwrap();
		}

		tokio::time::sleep(std::time::Duration::from_millis(50)).await;
		let size = handle.size().await.unwrap();
		assert_eq!(size, 1, "cap of 2 should leave exactly one waiting once serving fills up");

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn manual_release_is_additive_to_budget() {
		let store = Arc::new(FakeStore {
			serving: AtomicUsize::new(0),
			transitioned: StdMutex::new(Vec::new()),
		});
		let publisher = Arc::new(FakePublisher { events: StdMutex::new(Vec::new()) });
		let root = CancellationToken::new();
		let queue_id = QueueId::new();
		// Zero automatic budget: release rate 0.
		let handle = ControllerHandle::spawn(queue_id, 10, 0, std::time::Duration::from_millis(5), None, store, publisher, &root);
		handle.start().unwrap();

		let session_id = SessionId::new();
		let entry = WaitingEntry {
			priority: Priority::Normal,
			enqueued_at: Utc::now(),
			session_id,
		};
		handle.enqueue(entry, "user").unwrap();
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		assert_eq!(handle.size().await.unwrap(), 1);

		handle.manual_release(session_id).await.unwrap();
		assert_eq!(handle.size().await.unwrap(), 0);

		handle.shutdown().await;
	}

	/// Store that actually tracks which sessions are `Serving`, so
	/// `Complete` frees a cap slot the way the real store does. `FakeStore`
	/// above only ever grows its counter, which can't exercise a
	/// serve-then-complete-then-serve-again sequence.
	struct TrackingStore {
		serving: StdMutex<std::collections::HashSet<SessionId>>,
		served_order: StdMutex<Vec<SessionId>>,
	}

	#[async_trait]
	impl SessionStore for TrackingStore {
		async fn get(&self, _id: SessionId) -> Result<Option<crate::model::UserSession>, Err_> {
			Ok(None)
		}

		async fn bulk_transition(&self, ids: &[SessionId], to: SessionStatus) -> Result<Vec<SessionId>, Err_> {
			let mut serving = self.serving.lock().unwrap();
			match to {
				SessionStatus::Serving => {
					for id in ids {
						serving.insert(*id);
						self.served_order.lock().unwrap().push(*id);
					}
				}
				SessionStatus::Released | SessionStatus::Dropped => {
					for id in ids {
						serving.remove(id);
					}
				}
				SessionStatus::Waiting => {}
			}
			Ok(ids.to_vec())
		}

		async fn count_serving(&self, _queue_id: QueueId) -> Result<u32, Err_> {
			Ok(self.serving.lock().unwrap().len() as u32)
		}
	}

	#[tokio::test]
	async fn higher_priority_arrival_preempts_a_lower_priority_one_waiting_for_the_next_free_slot() {
		let store = Arc::new(TrackingStore {
			serving: StdMutex::new(std::collections::HashSet::new()),
			served_order: StdMutex::new(Vec::new()),
		});
		let publisher = Arc::new(FakePublisher { events: StdMutex::new(Vec::new()) });
		let root = CancellationToken::new();
		let queue_id = QueueId::new();
		// cap 1, fast high-budget ticks: whichever session is at the head of
		// the waiting set when a slot frees up is the one served next.
		let handle = ControllerHandle::spawn(queue_id, 1, 60_000, std::time::Duration::from_millis(5), None, store.clone(), publisher, &root);
		handle.start().unwrap();

		let normal_first = SessionId::new();
		handle
			.enqueue(
				WaitingEntry {
					priority: Priority::Normal,
					enqueued_at: Utc::now(),
					session_id: normal_first,
				},
				"normal-first",
			)
			.unwrap();
		tokio::time::sleep(std::time::Duration::from_millis(30)).await;
		assert_eq!(store.served_order.lock().unwrap().as_slice(), &[normal_first], "cap of 1 should admit the only waiting session");

		let normal_second = SessionId::new();
		handle
			.enqueue(
				WaitingEntry {
					priority: Priority::Normal,
					enqueued_at: Utc::now(),
					session_id: normal_second,
				},
				"normal-second",
			)
			.unwrap();
		let vip = SessionId::new();
		handle
			.enqueue(
				WaitingEntry {
					priority: Priority::Vip,
					enqueued_at: Utc::now(),
					session_id: vip,
				},
				"vip",
			)
			.unwrap();

		// Cap is still full of normal_first, so neither new arrival is served yet.
		tokio::time::sleep(std::time::Duration::from_millis(30)).await;
		assert_eq!(store.served_order.lock().unwrap().as_slice(), &[normal_first]);

		handle.complete(normal_first).await.unwrap();
		tokio::time::sleep(std::time::Duration::from_millis(30)).await;
		assert_eq!(
			store.served_order.lock().unwrap().as_slice(),
			&[normal_first, vip],
			"the vip arrival should preempt the earlier-queued normal session for the freed slot"
		);

		handle.shutdown().await;
	}
}
