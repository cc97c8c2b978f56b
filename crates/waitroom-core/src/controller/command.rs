use super::ControllerState;
use crate::error::EngineError;
use crate::ids::SessionId;
use crate::model::{Priority, Schedule, WaitingEntry};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum ControllerCommand {
	Start,
	Stop,
	/// Admit a newly created session into the waiting set.
	Enqueue {
		entry: WaitingEntry,
		user_identifier: String,
	},
	/// Remove a waiting session without serving it (operator drop, or a
	/// client that disconnected before being served).
	Drop {
		session_id: SessionId,
		reply: oneshot::Sender<bool>,
	},
	/// Release one specific waiting session immediately, additive to the
	/// tick's automatic budget.
	ManualRelease {
		session_id: SessionId,
		reply: oneshot::Sender<Result<(), EngineError>>,
	},
	/// A served session's use of the protected resource has ended; transitions
	/// it `Serving` -> `Released` and frees the cap slot it held.
	Complete {
		session_id: SessionId,
		reply: oneshot::Sender<Result<(), EngineError>>,
	},
	SetCap(u32),
	SetReleaseRate(u32),
	SetSchedule(Option<Schedule>),
	/// Release up to `count` waiting sessions immediately, bounded by
	/// remaining cap headroom and queue size, additive to the tick budget.
	ReleaseN {
		count: usize,
		reply: oneshot::Sender<Result<Vec<SessionId>, EngineError>>,
	},
	/// A waiting session's priority changed; re-insert it at its new rank.
	Reprioritize {
		session_id: SessionId,
		priority: Priority,
	},
	PositionOf {
		session_id: SessionId,
		reply: oneshot::Sender<Option<usize>>,
	},
	Peek {
		n: usize,
		reply: oneshot::Sender<Vec<WaitingEntry>>,
	},
	Size {
		reply: oneshot::Sender<usize>,
	},
	GetState {
		reply: oneshot::Sender<ControllerState>,
	},
}
