//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic checks on resolved Settings (serde and the env parser handle syntax)
//! - Validate value ranges (ports, intervals, timeouts)
//! - Detect conflicting values (health and RPC on the same port)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: &Settings → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::Settings;

/// A single semantic problem with the resolved settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be <host>:<port>, got {value:?}")]
    NotHostPort { field: &'static str, value: String },

    #[error("{field} must be non-zero")]
    Zero { field: &'static str },

    #[error("rest_port and grpc_port are both {0}")]
    PortConflict(u16),
}

/// Validate resolved settings.
pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.instance_id.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "instance_id" });
    }
    if settings.internal_host_address.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "internal_host_address" });
    }
    if settings.external_host_address.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "external_host_address" });
    }

    check_host_port("consul", &settings.consul, &mut errors);
    if let Some(fluentd) = &settings.fluentd {
        check_host_port("fluentd", fluentd, &mut errors);
    }

    if settings.rest_port == 0 {
        errors.push(ValidationError::Zero { field: "rest_port" });
    }
    if settings.grpc_port == 0 {
        errors.push(ValidationError::Zero { field: "grpc_port" });
    }
    if settings.rest_port != 0 && settings.rest_port == settings.grpc_port {
        errors.push(ValidationError::PortConflict(settings.rest_port));
    }
    if settings.heartbeat_interval.is_zero() {
        errors.push(ValidationError::Zero { field: "heartbeat.interval_secs" });
    }
    if settings.shutdown_timeout.is_zero() {
        errors.push(ValidationError::Zero { field: "lifecycle.shutdown_timeout_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_host_port(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let valid = value
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p != 0));
    if !valid {
        errors.push(ValidationError::NotHostPort {
            field,
            value: value.to_string(),
        });
    }
}
