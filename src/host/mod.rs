//! Host, network and container identity.
//!
//! # Responsibilities
//! - Name the primary network interface (default route)
//! - Find the primary local IPv4 address
//! - Look up the Docker container name of this process
//!
//! Lookups are synchronous and run once, during configuration resolution.

pub mod docker;
pub mod net;

use std::path::PathBuf;

use thiserror::Error;

/// Errors from identity lookups.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("HOSTNAME is not set, cannot identify the container")]
    NoContainerId,

    #[error("docker engine request failed: {0}")]
    Docker(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identity lookups consumed by the config resolver.
pub trait HostIdentity {
    /// Interface carrying the default route.
    fn primary_interface(&self) -> String;

    /// Primary local IPv4 address, as text.
    fn primary_local_ipv4(&self) -> String;

    /// Name of the container this process runs in.
    fn container_name(&self) -> Result<String, HostError>;
}

/// Lookups against the real host.
#[derive(Debug, Clone)]
pub struct SystemHost {
    /// Container id (`HOSTNAME` under Docker).
    container_id: Option<String>,
    docker_socket: PathBuf,
}

impl SystemHost {
    pub fn new(container_id: Option<String>) -> Self {
        Self {
            container_id,
            docker_socket: PathBuf::from(docker::DEFAULT_SOCKET),
        }
    }

    pub fn with_docker_socket(mut self, socket: impl Into<PathBuf>) -> Self {
        self.docker_socket = socket.into();
        self
    }
}

impl HostIdentity for SystemHost {
    fn primary_interface(&self) -> String {
        net::primary_interface().unwrap_or_else(|| net::FALLBACK_INTERFACE.to_string())
    }

    fn primary_local_ipv4(&self) -> String {
        net::primary_local_ipv4().to_string()
    }

    fn container_name(&self) -> Result<String, HostError> {
        let id = self.container_id.as_deref().ok_or(HostError::NoContainerId)?;
        docker::container_name_blocking(&self.docker_socket, id)
    }
}
