//! Supervised subsystems.
//!
//! Started in this order and shut down in reverse:
//! ```text
//! coordinator.rs  register with Consul        / deregister
//! health.rs       serve GET /health           / stop serving
//! rpc.rs          serve the northbound API    / stop serving
//! ```
//!
//! Each one is constructed from `Settings` without I/O and does all of its
//! binding and registering in `start`.

use std::time::Duration;

pub mod coordinator;
pub mod health;
pub mod rpc;

pub use coordinator::{ConsulRegistration, Registration};
pub use health::{HealthEndpoint, HealthStatus};
pub use rpc::{InstanceInfo, RpcServer};

/// Per-request deadline of the served endpoints.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
