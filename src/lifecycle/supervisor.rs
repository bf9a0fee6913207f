//! Ordered startup and ordered, awaited shutdown.
//!
//! # Responsibilities
//! - Hold the declared subsystems in their fixed start order
//! - Start each exactly once, in order, stopping at the first failure
//! - Shut down every started subsystem in reverse order, one at a time
//! - Publish process state transitions

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::lifecycle::state::ProcessState;
use crate::lifecycle::subsystem::{BoxError, Subsystem};

/// A start failure. Fatal for the process.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("subsystem '{name}' failed to start: {source}")]
    Subsystem {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("startup already ran")]
    AlreadyStarted,

    #[error("supervisor is {0}, startup is no longer possible")]
    NotInitializing(ProcessState),
}

/// A shutdown failure. Logged and absorbed.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("subsystem '{name}' failed to shut down: {source}")]
    Failed {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("subsystem '{name}' did not shut down within {timeout:?}")]
    TimedOut { name: String, timeout: Duration },
}

/// Outcome of one shutdown round, in teardown order.
#[derive(Debug, Default)]
pub struct ShutdownSummary {
    pub completed: Vec<String>,
    pub failures: Vec<ShutdownError>,
}

impl ShutdownSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the supervised set and drives it through the lifecycle.
pub struct LifecycleSupervisor {
    /// Declared, not yet started, in start order.
    declared: Vec<Box<dyn Subsystem>>,
    /// Started subsystems, in start order.
    supervised: Vec<Box<dyn Subsystem>>,
    shutdown_timeout: Duration,
    state: watch::Sender<ProcessState>,
    startup_attempted: bool,
    startup_completed: bool,
}

impl LifecycleSupervisor {
    /// `shutdown_timeout` bounds each subsystem's shutdown.
    pub fn new(shutdown_timeout: Duration) -> Self {
        let (state, _) = watch::channel(ProcessState::Initializing);
        Self {
            declared: Vec::new(),
            supervised: Vec::new(),
            shutdown_timeout,
            state,
            startup_attempted: false,
            startup_completed: false,
        }
    }

    /// Append a subsystem to the start order. Ignored once startup or
    /// shutdown has run.
    pub fn declare(&mut self, subsystem: Box<dyn Subsystem>) {
        if self.startup_attempted {
            tracing::warn!(
                subsystem = subsystem.name(),
                state = %self.state(),
                "Declaration closed, subsystem not declared"
            );
            return;
        }
        self.declared.push(subsystem);
    }

    /// Current process state.
    pub fn state(&self) -> ProcessState {
        *self.state.borrow()
    }

    /// Receiver for process state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ProcessState> {
        self.state.subscribe()
    }

    /// Number of subsystems that are started and not yet shut down.
    pub fn running_count(&self) -> usize {
        self.supervised.len()
    }

    /// Start every declared subsystem in declaration order.
    ///
    /// Stops at the first failure. Subsystems started before it stay running
    /// and remain in the supervised set; later ones are never started.
    pub async fn startup(&mut self) -> Result<(), StartupError> {
        let state = self.state();
        if state != ProcessState::Initializing {
            return Err(StartupError::NotInitializing(state));
        }
        if self.startup_attempted {
            return Err(StartupError::AlreadyStarted);
        }
        self.startup_attempted = true;

        let declared = std::mem::take(&mut self.declared);
        tracing::info!(count = declared.len(), "Starting subsystems");

        for mut subsystem in declared {
            let name = subsystem.name().to_string();
            tracing::debug!(subsystem = %name, "Starting subsystem");

            if let Err(source) = subsystem.start().await {
                tracing::debug!(
                    subsystem = %name,
                    started = self.supervised.len(),
                    "Startup aborted"
                );
                return Err(StartupError::Subsystem { name, source });
            }

            tracing::info!(subsystem = %name, "Subsystem started");
            self.supervised.push(subsystem);
        }
        self.startup_completed = true;
        Ok(())
    }

    /// Move to Running. Only valid after a complete startup.
    pub fn mark_running(&mut self) -> bool {
        if !self.startup_completed {
            return false;
        }
        self.transition(ProcessState::Running)
    }

    /// Shut down every started subsystem in reverse order.
    ///
    /// Each shutdown is awaited (bounded by the shutdown timeout) before the
    /// next begins. Failures are logged and do not stop the sequence. A call
    /// after the supervisor reached Stopped does nothing. Declared but
    /// unstarted subsystems are dropped; startup is refused from here on.
    pub async fn shutdown(&mut self) -> ShutdownSummary {
        let mut summary = ShutdownSummary::default();
        if self.state() == ProcessState::Stopped {
            return summary;
        }
        self.startup_attempted = true;
        self.declared.clear();

        tracing::info!(
            subsystems = self.supervised.len(),
            from = %self.state(),
            "Shutdown initiated"
        );
        self.transition(ProcessState::ShuttingDown);

        while let Some(mut subsystem) = self.supervised.pop() {
            let name = subsystem.name().to_string();
            tracing::debug!(subsystem = %name, "Shutting down subsystem");

            match tokio::time::timeout(self.shutdown_timeout, subsystem.shutdown()).await {
                Ok(Ok(())) => {
                    tracing::info!(subsystem = %name, "Subsystem stopped");
                    summary.completed.push(name);
                }
                Ok(Err(source)) => {
                    tracing::warn!(subsystem = %name, error = %source, "Subsystem shutdown failed");
                    summary.failures.push(ShutdownError::Failed { name, source });
                }
                Err(_) => {
                    tracing::warn!(
                        subsystem = %name,
                        timeout_secs = self.shutdown_timeout.as_secs_f64(),
                        "Subsystem shutdown timed out"
                    );
                    summary.failures.push(ShutdownError::TimedOut {
                        name,
                        timeout: self.shutdown_timeout,
                    });
                }
            }
        }

        self.transition(ProcessState::Stopped);
        tracing::info!(
            clean = summary.is_clean(),
            stopped = summary.completed.len(),
            failed = summary.failures.len(),
            "Shutdown complete"
        );
        summary
    }

    fn transition(&self, next: ProcessState) -> bool {
        let current = self.state();
        if !current.can_transition_to(next) {
            tracing::debug!(from = %current, to = %next, "Ignoring invalid state transition");
            return false;
        }
        self.state.send_replace(next);
        tracing::debug!(from = %current, to = %next, "Process state changed");
        true
    }
}

impl std::fmt::Debug for LifecycleSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleSupervisor")
            .field("declared", &self.declared.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("supervised", &self.supervised.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("state", &self.state())
            .finish()
    }
}
