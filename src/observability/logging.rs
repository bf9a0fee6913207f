//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global subscriber from the `[logging]` section
//! - Shift the base level by the command-line verbosity delta
//! - Optionally mirror every record as JSON to a UDP telemetry sink
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` replaces the computed filter entirely
//! - The telemetry socket is non-blocking; a record that cannot be sent is
//!   dropped

use std::io::{self, Write};
use std::net::UdpSocket;
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::{
    filter::ParseError, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError, EnvFilter, Layer,
};

use crate::config::{LogFormat, LoggingConfig};

/// Levels from least to most verbose.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        filter: String,
        #[source]
        source: ParseError,
    },

    #[error("cannot reach telemetry sink '{addr}': {source}")]
    Telemetry {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// `base` moved `verbosity` steps towards trace (positive) or error
/// (negative). An unknown base counts as info.
pub fn effective_level(base: &str, verbosity: i32) -> &'static str {
    let base = LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(base.trim()))
        .unwrap_or(2) as i32;
    let index = (base + verbosity).clamp(0, LEVELS.len() as i32 - 1);
    LEVELS[index as usize]
}

/// Filter directives for `config` and `verbosity`.
pub fn filter_directives(config: &LoggingConfig, verbosity: i32) -> String {
    if let Some(filter) = &config.filter_override {
        return filter.clone();
    }

    let mut directives = vec![effective_level(&config.level, verbosity).to_string()];
    directives.extend(
        config
            .targets
            .iter()
            .map(|(target, level)| format!("{target}={level}")),
    );
    directives.join(",")
}

/// Install the global subscriber.
///
/// `telemetry` is the `host:port` of a UDP log collector (fluentd).
pub fn init(
    config: &LoggingConfig,
    verbosity: i32,
    telemetry: Option<&str>,
) -> Result<(), LoggingError> {
    let directives = filter_directives(config, verbosity);
    let filter = EnvFilter::try_new(&directives).map_err(|source| LoggingError::Filter {
        filter: directives.clone(),
        source,
    })?;

    let console = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };

    let telemetry = telemetry
        .map(TelemetryWriter::connect)
        .transpose()?
        .map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(telemetry)
        .try_init()?;

    tracing::debug!(filter = %directives, "Logging initialized");
    Ok(())
}

/// Plain console logging at info, for failures before the config is known.
/// Does nothing if a subscriber is already installed.
pub fn init_fallback() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("info"))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Sends each formatted record as one UDP datagram.
#[derive(Debug, Clone)]
pub struct TelemetryWriter {
    socket: Arc<UdpSocket>,
}

impl TelemetryWriter {
    /// Bind an ephemeral local socket connected to `addr`.
    pub fn connect(addr: &str) -> Result<Self, LoggingError> {
        let wrap = |source| LoggingError::Telemetry {
            addr: addr.to_string(),
            source,
        };

        let socket = UdpSocket::bind("0.0.0.0:0").map_err(wrap)?;
        socket.connect(addr).map_err(wrap)?;
        socket.set_nonblocking(true).map_err(wrap)?;
        Ok(Self {
            socket: Arc::new(socket),
        })
    }
}

/// Buffers one record and sends it on drop.
pub struct TelemetryRecord {
    socket: Arc<UdpSocket>,
    buf: Vec<u8>,
}

impl Write for TelemetryRecord {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for TelemetryRecord {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            let _ = self.socket.send(&self.buf);
        }
    }
}

impl<'a> MakeWriter<'a> for TelemetryWriter {
    type Writer = TelemetryRecord;

    fn make_writer(&'a self) -> Self::Writer {
        TelemetryRecord {
            socket: Arc::clone(&self.socket),
            buf: Vec::with_capacity(256),
        }
    }
}
