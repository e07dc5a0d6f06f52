/// Lifecycle of a tracker's background detection.
///
/// `stop` passes through `Stopping` while it joins the worker. The tracker
/// is exclusively borrowed for that time, so callers only observe `Idle`
/// and `Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Running,
    Stopping,
}

impl TrackerState {
    pub fn is_running(&self) -> bool {
        matches!(self, TrackerState::Running)
    }
}
