//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGTERM/SIGINT handlers (Ctrl-C on non-Unix targets)
//! - Translate each signal into a [`Shutdown`] trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Repeated signals during shutdown are ignored; the per-subsystem
//!   shutdown timeout bounds teardown instead of a forced exit

use crate::lifecycle::shutdown::Shutdown;

/// Forward termination signals to `shutdown` until the signal streams close.
#[cfg(unix)]
pub async fn forward_signals(shutdown: Shutdown) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        let name = tokio::select! {
            Some(()) = sigint.recv() => "SIGINT",
            Some(()) = sigterm.recv() => "SIGTERM",
            else => return Ok(()),
        };
        tracing::debug!(signal = name, "Signal received");
        shutdown.trigger(name);
    }
}

/// Forward Ctrl-C to `shutdown`.
#[cfg(not(unix))]
pub async fn forward_signals(shutdown: Shutdown) -> std::io::Result<()> {
    loop {
        tokio::signal::ctrl_c().await?;
        tracing::debug!(signal = "ctrl-c", "Signal received");
        shutdown.trigger("ctrl-c");
    }
}
