//! Lifecycle of a session's current run

use crate::interpreter::executor::Line;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No run started yet
    Idle,
    /// Suspended before executing this line
    Paused(Line),
    /// Last run completed normally
    Finished,
    /// Last run ended with a fault or a trace failure
    Errored,
}

impl SessionState {
    pub fn can_continue(&self) -> bool {
        matches!(self, SessionState::Paused(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "no execution has been started"),
            SessionState::Paused(line) => write!(f, "paused at line {}", line),
            SessionState::Finished => write!(f, "the program has finished"),
            SessionState::Errored => write!(f, "the program stopped with an error"),
        }
    }
}
