//! Configuration schema definitions.
//!
//! `FileConfig` mirrors the TOML config file. `Settings` is the resolved,
//! immutable result handed to every component.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root of the config file.
///
/// Top-level values are optional; when present they take precedence over the
/// built-in defaults but yield to environment variables and CLI flags.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// `<host>:<port>` of the Consul agent.
    pub consul: Option<String>,

    /// Unique id of this instance.
    pub instance_id: Option<String>,

    /// Address at which this instance is reachable from outside the cluster.
    pub external_host_address: Option<String>,

    /// Address at which this instance is reachable from inside the cluster.
    pub internal_host_address: Option<String>,

    /// Network interface name.
    pub interface: Option<String>,

    /// `<host>:<port>` of the telemetry sink (fluentd UDP input).
    pub fluentd: Option<String>,

    /// Port of the health/status endpoint.
    pub rest_port: Option<u16>,

    /// Port of the northbound RPC server.
    pub grpc_port: Option<u16>,

    /// Logging backend settings.
    pub logging: LoggingConfig,

    /// Heartbeat settings.
    pub heartbeat: HeartbeatConfig,

    /// Startup/shutdown settings.
    pub lifecycle: LifecycleConfig,
}

/// Output format of the console log layer.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level (trace, debug, info, warn, error) before the verbosity delta.
    pub level: String,

    /// Console output format.
    pub format: LogFormat,

    /// Per-target level directives, e.g. `hyper = "warn"`.
    pub targets: BTreeMap<String, String>,

    /// Replaces the computed filter entirely. Filled from `RUST_LOG`.
    #[serde(skip)]
    pub filter_override: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            targets: BTreeMap::new(),
            filter_override: None,
        }
    }
}

/// `[heartbeat]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Seconds between two heartbeat records.
    pub interval_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// `[lifecycle]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Upper bound on each subsystem's shutdown, in seconds.
    pub shutdown_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: 30,
        }
    }
}

/// Resolved runtime settings.
///
/// Built once by [`resolve`](crate::config::resolve) and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Config file that was loaded, if any.
    pub config_path: Option<PathBuf>,
    pub instance_id: String,
    pub consul: String,
    pub external_host_address: String,
    pub internal_host_address: String,
    pub interface: String,
    pub fluentd: Option<String>,
    pub rest_port: u16,
    pub grpc_port: u16,
    /// `verbose - quiet` from the command line.
    pub verbosity: i32,
    pub heartbeat_enabled: bool,
    pub heartbeat_interval: Duration,
    pub banner: bool,
    pub shutdown_timeout: Duration,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Settings for local use and tests: loopback addresses, default ports.
    pub fn local(instance_id: impl Into<String>) -> Self {
        Self {
            config_path: None,
            instance_id: instance_id.into(),
            consul: "localhost:8500".to_string(),
            external_host_address: "127.0.0.1".to_string(),
            internal_host_address: "127.0.0.1".to_string(),
            interface: "lo".to_string(),
            fluentd: None,
            rest_port: 8880,
            grpc_port: 50055,
            verbosity: 0,
            heartbeat_enabled: true,
            heartbeat_interval: Duration::from_secs(10),
            banner: true,
            shutdown_timeout: Duration::from_secs(30),
            logging: LoggingConfig::default(),
        }
    }
}
