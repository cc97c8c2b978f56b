#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
	Stopped,
	Running,
	/// Running but the queue's schedule currently evaluates to closed; the
	/// tick loop still executes but releases nothing.
	Suspended,
	/// A structural store error halted the tick loop; already-released
	/// sessions are not rolled back. Only `Stop` followed by a fresh `Start`
	/// recovers from this state.
	Failed,
}
