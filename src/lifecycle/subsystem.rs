//! Start/shutdown contract of a supervised subsystem.

use async_trait::async_trait;

/// Error type returned across the subsystem boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A unit the supervisor can start and stop.
///
/// Subsystems are constructed with the settings they need and are started at
/// most once. `shutdown` is only called on a subsystem whose `start`
/// succeeded, and at most once.
#[async_trait]
pub trait Subsystem
where
    Self: Send + Sync + 'static,
{
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Start the subsystem. Returns once it is up.
    async fn start(&mut self) -> Result<(), BoxError>;

    /// Stop the subsystem. Returns once teardown is complete.
    async fn shutdown(&mut self) -> Result<(), BoxError>;
}
