//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All components produce:
//!     → logging.rs (structured log events via tracing)
//!         → console (pretty or JSON)
//!         → telemetry sink (JSON over UDP, optional)
//!
//! Event loop:
//!     → heartbeat.rs (periodic liveness record → emitter thread → sink)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Log level set once at startup from config and verbosity flags
//! - The heartbeat never blocks the event loop

pub mod heartbeat;
pub mod logging;

pub use heartbeat::{Heartbeat, HeartbeatSink, HeartbeatTimer, LogSink};
pub use logging::{init as init_logging, init_fallback, LoggingError};
