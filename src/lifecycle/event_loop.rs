//! The process event loop.
//!
//! # Responsibilities
//! - Own the single-threaded cooperative scheduler
//! - Run the heartbeat and the signal listener while the process is up
//! - Run the supervisor's shutdown exactly once when termination is
//!   requested, before the loop stops
//!
//! # Design Decisions
//! - A tokio current-thread runtime; `run` is the only blocking call
//! - Startup runs on the same runtime through `block_on` so subsystems can
//!   bind sockets and spawn their tasks before the loop is entered
//! - After the loop stops the runtime gets a short grace period, then any
//!   remaining blocking work is abandoned

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tracing::Instrument;

use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::forward_signals;
use crate::lifecycle::supervisor::{LifecycleSupervisor, ShutdownSummary};
use crate::observability::HeartbeatTimer;

/// Time left to runtime tasks after the loop returns.
const RUNTIME_GRACE: Duration = Duration::from_secs(1);

pub struct EventLoop {
    runtime: Runtime,
}

impl EventLoop {
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .thread_name("service-host")
            .build()?;
        Ok(Self { runtime })
    }

    /// Run `future` to completion on the loop's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Enter the loop and block until the supervisor reached Stopped.
    ///
    /// OS termination signals are forwarded to `shutdown`.
    pub fn run(
        self,
        supervisor: &mut LifecycleSupervisor,
        heartbeat: Option<HeartbeatTimer>,
        shutdown: Shutdown,
    ) -> ShutdownSummary {
        let summary = self.runtime.block_on(async {
            let signals = tokio::spawn({
                let shutdown = shutdown.clone();
                async move {
                    if let Err(e) = forward_signals(shutdown).await {
                        tracing::error!(error = %e, "Failed to install signal handlers");
                    }
                }
            });

            let summary = drive(supervisor, heartbeat, &shutdown).await;
            signals.abort();
            summary
        });

        self.runtime.shutdown_timeout(RUNTIME_GRACE);
        tracing::debug!("Event loop stopped");
        summary
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop").finish_non_exhaustive()
    }
}

/// Body of the loop: mark the process running, arm the heartbeat, wait for
/// termination, then shut the supervisor down.
///
/// Returns only once the supervisor has reached Stopped.
pub async fn drive(
    supervisor: &mut LifecycleSupervisor,
    heartbeat: Option<HeartbeatTimer>,
    shutdown: &Shutdown,
) -> ShutdownSummary {
    tracing::info!("Event loop started");
    supervisor.mark_running();

    let heartbeat = heartbeat.map(|timer| tokio::spawn(timer.run().in_current_span()));

    shutdown.triggered().await;
    let summary = supervisor.shutdown().await;

    if let Some(task) = heartbeat {
        task.abort();
        tracing::debug!("Heartbeat stopped");
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::state::ProcessState;
    use crate::lifecycle::supervisor::tests::{calls, Calls, Recording};
    use crate::observability::heartbeat::tests::{collect, ChannelSink};
    use tracing_test::traced_test;

    fn supervisor_with(log: &Calls, names: &[&'static str]) -> LifecycleSupervisor {
        let mut supervisor = LifecycleSupervisor::new(Duration::from_secs(5));
        for name in names {
            supervisor.declare(Box::new(Recording::new(*name, log)));
        }
        supervisor
    }

    #[tokio::test]
    async fn test_drive_returns_after_stopped() {
        let log = Calls::default();
        let mut supervisor = supervisor_with(&log, &["A", "B", "C"]);
        supervisor.startup().await.unwrap();
        let state = supervisor.subscribe_state();
        let shutdown = Shutdown::new();

        let trigger = async {
            let mut state = state.clone();
            state
                .wait_for(|s| *s == ProcessState::Running)
                .await
                .unwrap();
            shutdown.trigger("test");
        };
        let (summary, ()) = tokio::join!(drive(&mut supervisor, None, &shutdown), trigger);

        assert_eq!(*state.borrow(), ProcessState::Stopped);
        assert_eq!(summary.completed, ["C", "B", "A"]);
        assert_eq!(
            calls(&log),
            ["start:A", "start:B", "start:C", "shutdown:C", "shutdown:B", "shutdown:A"]
        );
    }

    #[tokio::test]
    async fn test_termination_before_loop_entry() {
        let log = Calls::default();
        let mut supervisor = supervisor_with(&log, &["A"]);
        supervisor.startup().await.unwrap();
        let shutdown = Shutdown::new();
        shutdown.trigger("test");

        let summary = drive(&mut supervisor, None, &shutdown).await;
        assert_eq!(summary.completed, ["A"]);
        assert_eq!(supervisor.state(), ProcessState::Stopped);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_repeated_trigger_runs_one_teardown() {
        let log = Calls::default();
        let mut supervisor = supervisor_with(&log, &["A", "B"]);
        supervisor.startup().await.unwrap();
        let shutdown = Shutdown::new();

        let trigger = async {
            tokio::task::yield_now().await;
            shutdown.trigger("SIGINT");
            shutdown.trigger("SIGINT");
        };
        tokio::join!(drive(&mut supervisor, None, &shutdown), trigger);
        shutdown.trigger("SIGTERM");

        let teardowns = calls(&log).iter().filter(|c| c.starts_with("shutdown")).count();
        assert_eq!(teardowns, 2);
        assert!(logs_contain("Event loop started"));
        assert!(logs_contain("Termination already in progress"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_runs_while_loop_is_up() {
        let log = Calls::default();
        let mut supervisor = supervisor_with(&log, &["A"]);
        supervisor.startup().await.unwrap();
        let shutdown = Shutdown::new();
        let (sink, beats) = ChannelSink::new();
        let timer = HeartbeatTimer::with_sink(Duration::from_secs(10), sink);

        let trigger = async {
            tokio::time::sleep(Duration::from_secs(25)).await;
            shutdown.trigger("test");
        };
        tokio::join!(drive(&mut supervisor, Some(timer), &shutdown), trigger);

        let uptimes: Vec<u64> = collect(&beats, 3).iter().map(|b| b.uptime.as_secs()).collect();
        assert_eq!(uptimes, [0, 10, 20]);
    }

    #[test]
    fn test_run_blocks_until_shutdown_completes() {
        let log = Calls::default();
        let mut supervisor = supervisor_with(&log, &["A", "B"]);
        let event_loop = EventLoop::new().unwrap();
        event_loop.block_on(supervisor.startup()).unwrap();

        let shutdown = Shutdown::new();
        let trigger = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                shutdown.trigger("test");
            })
        };

        let summary = event_loop.run(&mut supervisor, None, shutdown);
        trigger.join().unwrap();

        assert!(summary.is_clean());
        assert_eq!(supervisor.state(), ProcessState::Stopped);
        assert_eq!(calls(&log), ["start:A", "start:B", "shutdown:B", "shutdown:A"]);
    }
}
