//! Service host: process lifecycle supervisor.
//!
//! Resolves settings, starts a fixed set of subsystems in order, runs a
//! heartbeat on a single-threaded event loop and, on termination, shuts the
//! subsystems down in reverse order before the process exits.

// Configuration
pub mod config;
pub mod host;

// Lifecycle core
pub mod lifecycle;

// Subsystems and their plumbing
pub mod http;
pub mod resilience;
pub mod subsystems;

// Cross-cutting concerns
pub mod observability;

pub use config::Settings;
pub use lifecycle::{EventLoop, LifecycleSupervisor, Shutdown, Subsystem};
