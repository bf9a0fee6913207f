//! Periodic liveness record.
//!
//! # Responsibilities
//! - Capture the start instant and a human-readable start label at arm time
//! - Emit `{status, since, uptime}` immediately and then every period
//! - Hand records to a dedicated emitter thread over a bounded queue
//!
//! # Design Decisions
//! - Uptime is recomputed from the fixed origin on each tick, never
//!   accumulated
//! - A full queue drops the record; the tick never waits on the sink
//! - Sink errors are logged and swallowed

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::lifecycle::BoxError;

/// Records queued between the timer and the emitter thread.
const QUEUE_DEPTH: usize = 8;

/// ctime-style label, e.g. `Sat Oct 18 09:41:07 2026`.
const SINCE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

pub const STATUS_UP: &str = "up";

/// One liveness record.
#[derive(Debug, Clone, PartialEq)]
pub struct Heartbeat {
    pub status: &'static str,
    /// Local start time, ctime style.
    pub since: String,
    pub uptime: Duration,
}

/// Destination of heartbeat records. Runs on the emitter thread.
pub trait HeartbeatSink: Send + 'static {
    fn emit(&mut self, beat: &Heartbeat) -> Result<(), BoxError>;
}

/// Logs each record at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl HeartbeatSink for LogSink {
    fn emit(&mut self, beat: &Heartbeat) -> Result<(), BoxError> {
        tracing::debug!(
            status = beat.status,
            since = %beat.since,
            uptime = beat.uptime.as_secs_f64(),
            "Heartbeat"
        );
        Ok(())
    }
}

/// Fires a heartbeat record on a fixed period.
pub struct HeartbeatTimer {
    period: Duration,
    sink: Box<dyn HeartbeatSink>,
}

impl HeartbeatTimer {
    /// Timer logging through [`LogSink`].
    pub fn new(period: Duration) -> Self {
        Self::with_sink(period, LogSink)
    }

    pub fn with_sink(period: Duration, sink: impl HeartbeatSink) -> Self {
        Self {
            period,
            sink: Box::new(sink),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm the timer and tick until the task is dropped or aborted.
    pub async fn run(self) {
        let origin = Instant::now();
        let since = chrono::Local::now().format(SINCE_FORMAT).to_string();

        let queue = match spawn_emitter(self.sink) {
            Ok(queue) => queue,
            Err(e) => {
                tracing::warn!(error = %e, "Heartbeat emitter unavailable, heartbeat disabled");
                return;
            }
        };

        tracing::info!(period_secs = self.period.as_secs_f64(), since = %since, "Heartbeat armed");

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let beat = Heartbeat {
                status: STATUS_UP,
                since: since.clone(),
                uptime: origin.elapsed(),
            };
            match queue.try_send(beat) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!("Heartbeat emitter busy, record dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!("Heartbeat emitter gone, heartbeat stopped");
                    return;
                }
            }
        }
    }
}

impl std::fmt::Debug for HeartbeatTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatTimer")
            .field("period", &self.period)
            .finish()
    }
}

/// Start the emitter thread. It exits once the returned sender is dropped.
fn spawn_emitter(mut sink: Box<dyn HeartbeatSink>) -> std::io::Result<mpsc::Sender<Heartbeat>> {
    let (tx, mut rx) = mpsc::channel::<Heartbeat>(QUEUE_DEPTH);
    let span = tracing::Span::current();

    std::thread::Builder::new()
        .name("heartbeat-emitter".to_string())
        .spawn(move || {
            let _entered = span.enter();
            while let Some(beat) = rx.blocking_recv() {
                if let Err(e) = sink.emit(&beat) {
                    tracing::warn!(error = %e, "Heartbeat emit failed");
                }
            }
        })?;

    Ok(tx)
}
