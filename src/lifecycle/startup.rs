//! Startup orchestration.
//!
//! # Responsibilities
//! - Construct every subsystem from the resolved settings
//! - Declare them with the supervisor in dependency order
//!
//! # Design Decisions
//! - The order is fixed: coordination client, health endpoint, RPC server
//! - Construction does no I/O; sockets are bound in `start`

use tokio::sync::watch;

use crate::config::Settings;
use crate::lifecycle::state::ProcessState;
use crate::lifecycle::subsystem::Subsystem;
use crate::lifecycle::supervisor::LifecycleSupervisor;
use crate::subsystems::{ConsulRegistration, HealthEndpoint, RpcServer};

/// The process's subsystems, in start order.
pub fn build_subsystems(
    settings: &Settings,
    state: watch::Receiver<ProcessState>,
) -> Vec<Box<dyn Subsystem>> {
    vec![
        Box::new(ConsulRegistration::new(settings)),
        Box::new(HealthEndpoint::new(settings, state)),
        Box::new(RpcServer::new(settings)),
    ]
}

/// Declare the process's subsystems with `supervisor`.
pub fn declare_subsystems(supervisor: &mut LifecycleSupervisor, settings: &Settings) {
    let state = supervisor.subscribe_state();
    for subsystem in build_subsystems(settings, state) {
        tracing::debug!(subsystem = subsystem.name(), "Subsystem declared");
        supervisor.declare(subsystem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fixed_declaration_order() {
        let settings = Settings::local("7");
        let (_tx, rx) = watch::channel(ProcessState::Initializing);

        let names: Vec<String> = build_subsystems(&settings, rx)
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, ["coordinator", "health", "rpc"]);
    }

    #[test]
    fn test_declare_does_not_start() {
        let settings = Settings::local("7");
        let mut supervisor = LifecycleSupervisor::new(Duration::from_secs(1));

        declare_subsystems(&mut supervisor, &settings);
        assert_eq!(supervisor.running_count(), 0);
        assert_eq!(supervisor.state(), ProcessState::Initializing);
    }
}
