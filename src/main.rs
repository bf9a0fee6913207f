//! Service host entry point.
//!
//! ```text
//! args (with their env fallbacks) + HOSTNAME/RUST_LOG + host identity
//!     → resolve Settings            (fatal on error, phase = configuration)
//!     → init logging, banner
//!     → declare subsystems, start them in order
//!                                   (fatal on error, phase = startup)
//!     → event loop: heartbeat, wait for SIGINT/SIGTERM
//!     → shut subsystems down in reverse, exit 0
//! ```

use std::process::ExitCode;

use clap::Parser;

use service_host::config::{self, loader::install_dir, Cli, Environment, Settings};
use service_host::host::SystemHost;
use service_host::lifecycle::{startup, EventLoop, LifecycleSupervisor, Shutdown};
use service_host::observability::{self, HeartbeatTimer};

const BANNER: &str = r"
  ___  ___ _ ____ _(_) ___ ___       | |__   ___  ___| |_
 / __|/ _ \ '__\ \ / / |/ __/ _ \_____| '_ \ / _ \/ __| __|
 \__ \  __/ |   \ V /| | (_|  __/_____| | | | (_) \__ \ |_
 |___/\___|_|    \_/ |_|\___\___|     |_| |_|\___/|___/\__|
";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = Environment::capture();
    let host = SystemHost::new(env.hostname.clone());

    let settings = match install_dir().and_then(|dir| config::resolve(&cli, &env, &host, &dir)) {
        Ok(settings) => settings,
        Err(e) => {
            observability::init_fallback();
            tracing::error!(phase = "configuration", error = %e, "Fatal configuration error");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = observability::init_logging(
        &settings.logging,
        settings.verbosity,
        settings.fluentd.as_deref(),
    ) {
        observability::init_fallback();
        tracing::error!(phase = "configuration", error = %e, "Failed to initialize logging");
        return ExitCode::FAILURE;
    }

    if settings.banner {
        print_banner();
    }
    log_settings(&settings);

    let span = tracing::info_span!("service", instance_id = %settings.instance_id);
    let _entered = span.enter();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            tracing::error!(phase = "startup", error = %e, "Failed to build event loop");
            return ExitCode::FAILURE;
        }
    };

    let mut supervisor = LifecycleSupervisor::new(settings.shutdown_timeout);
    startup::declare_subsystems(&mut supervisor, &settings);

    if let Err(e) = event_loop.block_on(supervisor.startup()) {
        tracing::error!(phase = "startup", error = %e, "Fatal startup error");
        return ExitCode::FAILURE;
    }

    let heartbeat = settings
        .heartbeat_enabled
        .then(|| HeartbeatTimer::new(settings.heartbeat_interval));

    let summary = event_loop.run(&mut supervisor, heartbeat, Shutdown::new());
    if !summary.is_clean() {
        tracing::warn!(failed = summary.failures.len(), "Some subsystems did not shut down cleanly");
    }

    ExitCode::SUCCESS
}

fn print_banner() {
    for line in BANNER.lines().filter(|line| !line.trim().is_empty()) {
        tracing::info!("{line}");
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "(to stop: press Ctrl-C)");
}

fn log_settings(settings: &Settings) {
    tracing::info!(
        instance_id = %settings.instance_id,
        consul = %settings.consul,
        internal_host_address = %settings.internal_host_address,
        external_host_address = %settings.external_host_address,
        interface = %settings.interface,
        rest_port = settings.rest_port,
        grpc_port = settings.grpc_port,
        heartbeat = settings.heartbeat_enabled,
        config = ?settings.config_path,
        "Configuration resolved"
    );
}
