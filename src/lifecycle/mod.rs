//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs, supervisor.rs):
//!     Settings → declare subsystems in fixed order → start each, in order
//!
//! Event loop (event_loop.rs):
//!     Enter loop → Running → arm heartbeat → wait for termination
//!
//! Signals (signals.rs → shutdown.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → termination hook
//!
//! Shutdown (supervisor.rs):
//!     ShuttingDown → shut down each started subsystem in reverse, awaited → Stopped
//! ```
//!
//! # Design Decisions
//! - Fail fast: a start failure is fatal and is not rolled back
//! - Shutdown is sequential and best-effort; one failure does not stop the rest
//! - The loop never exits before the supervisor reaches Stopped

pub mod event_loop;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;
pub mod subsystem;
pub mod supervisor;

pub use event_loop::EventLoop;
pub use shutdown::Shutdown;
pub use state::ProcessState;
pub use subsystem::{BoxError, Subsystem};
pub use supervisor::{LifecycleSupervisor, ShutdownSummary, StartupError};
