/// Lifecycle of a session's traceroute run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No process; topology is whatever the last run or `clear` left.
    #[default]
    Idle,
    Running,
    /// Kill requested, waiting for the process to report its exit.
    Stopped,
    /// Closing the topology after exit. Transient.
    Finalizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LineReceived,
    ProcessClosed,
    StopRequested,
}

impl SessionState {
    /// Next state for `event`, or `None` if the event is ignored here.
    pub fn on(self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (Running, LineReceived) => Some(Running),
            // output already in flight when the kill was sent still counts
            (Stopped, LineReceived) => Some(Stopped),
            (Running | Stopped, ProcessClosed) => Some(Finalizing),
            (Running, StopRequested) => Some(Stopped),
            _ => None,
        }
    }

    /// Whether a process may still deliver events.
    pub fn is_live(self) -> bool {
        matches!(self, SessionState::Running | SessionState::Stopped)
    }
}
