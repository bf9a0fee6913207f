//! Process lifecycle state machine.
//!
//! # States
//! ```text
//! Initializing → Running → ShuttingDown → Stopped
//! ```
//!
//! - Initializing → Running: all subsystems started and the loop entered
//! - Initializing → ShuttingDown: shutdown requested before the loop ran
//! - Running → ShuttingDown: only through the termination hook
//! - ShuttingDown → Stopped: every started subsystem's shutdown awaited
//!
//! There is no direct Initializing → Stopped edge. After a failed startup
//! the process exits while still Initializing; an explicit shutdown takes it
//! through ShuttingDown first.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
}

impl ProcessState {
    /// Whether `self → next` is an edge of the state machine.
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::{Initializing, Running, ShuttingDown, Stopped};
        matches!(
            (self, next),
            (Initializing, Running)
                | (Initializing, ShuttingDown)
                | (Running, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessState::Initializing => "initializing",
            ProcessState::Running => "running",
            ProcessState::ShuttingDown => "shutting-down",
            ProcessState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
