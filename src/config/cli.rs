//! Command-line flags.
//!
//! Every flag-backed environment variable is read here by clap, so a parsed
//! [`Cli`] already holds "CLI, else environment". Value flags stay optional
//! so the resolver can still slot the config file in below them; the rest
//! of the chain lives in [`resolver`](crate::config::resolver).

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

#[derive(Debug, Default, Clone, Parser)]
#[command(name = "service-host")]
#[command(version, about = "Lifecycle supervisor for the service host", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file, ./service.toml if not given.
    /// If relative, it is relative to the directory of the executable.
    #[arg(short = 'c', long, env = "CONFIG")]
    pub config: Option<PathBuf>,

    /// <hostname>:<port> of the Consul agent (default localhost:8500)
    #[arg(short = 'C', long, env = "CONSUL")]
    pub consul: Option<String>,

    /// <hostname> or <ip> at which the host is reachable from outside the
    /// cluster
    #[arg(short = 'E', long, env = "EXTERNAL_HOST_ADDRESS")]
    pub external_host_address: Option<String>,

    /// <hostname>:<port> of the fluentd server. If not given, the address
    /// from the config file is used.
    #[arg(short = 'F', long, env = "FLUENTD")]
    pub fluentd: Option<String>,

    /// <hostname> or <ip> at which the host is reachable from inside the
    /// cluster
    #[arg(short = 'H', long, env = "INTERNAL_HOST_ADDRESS")]
    pub internal_host_address: Option<String>,

    /// Unique string id of this instance. Falls back to HOSTNAME, then 1.
    #[arg(short = 'i', long, env = "INSTANCE_ID")]
    pub instance_id: Option<String>,

    /// Network interface (default: interface of the default route)
    #[arg(short = 'I', long, env = "INTERFACE")]
    pub interface: Option<String>,

    /// Omit startup banner log lines
    #[arg(
        short = 'n',
        long,
        env = "NO_BANNER",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub no_banner: bool,

    /// Do not emit periodic heartbeat log messages
    #[arg(
        short = 'N',
        long,
        env = "NO_HEARTBEAT",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub no_heartbeat: bool,

    /// Port of the health/status endpoint (default 8880)
    #[arg(short = 'R', long, env = "REST_PORT")]
    pub rest_port: Option<u16>,

    /// Port of the northbound RPC server (default 50055)
    #[arg(short = 'G', long, env = "GRPC_PORT")]
    pub grpc_port: Option<u16>,

    /// Suppress debug and info logs (repeatable)
    #[arg(short = 'q', long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Enable verbose logging (repeatable)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Use the docker container name as instance id (overrides -i/--instance-id)
    #[arg(
        long,
        env = "INSTANCE_ID_IS_CONTAINER_NAME",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub instance_id_is_container_name: bool,
}

impl Cli {
    /// Verbosity shift applied to the configured log level.
    pub fn verbosity(&self) -> i32 {
        i32::from(self.verbose) - i32::from(self.quiet)
    }
}
