//! Health-check HTTP endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::Settings;
use crate::http::{HttpServer, SequentialRequestId};
use crate::lifecycle::{BoxError, ProcessState, Subsystem};
use crate::subsystems::REQUEST_TIMEOUT;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub instance_id: String,
}

#[derive(Clone)]
struct HealthState {
    instance_id: Arc<str>,
    process: watch::Receiver<ProcessState>,
}

/// Serves `GET /health`: 200 `up` until shutdown begins, then 503 `stopping`.
pub struct HealthEndpoint {
    instance_id: String,
    process: watch::Receiver<ProcessState>,
    server: HttpServer,
}

impl HealthEndpoint {
    pub fn new(settings: &Settings, process: watch::Receiver<ProcessState>) -> Self {
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.rest_port));
        Self {
            instance_id: settings.instance_id.clone(),
            process,
            server: HttpServer::new("health", addr, REQUEST_TIMEOUT),
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    fn router(&self) -> Router {
        let state = HealthState {
            instance_id: Arc::from(self.instance_id.as_str()),
            process: self.process.clone(),
        };
        Router::new()
            .route("/health", get(health))
            .with_state(state)
    }
}

async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthStatus>) {
    let process = *state.process.borrow();
    let (code, status) = match process {
        ProcessState::Initializing | ProcessState::Running => (StatusCode::OK, "up"),
        ProcessState::ShuttingDown | ProcessState::Stopped => {
            (StatusCode::SERVICE_UNAVAILABLE, "stopping")
        }
    };

    (
        code,
        Json(HealthStatus {
            status: status.to_string(),
            instance_id: state.instance_id.to_string(),
        }),
    )
}

#[async_trait]
impl Subsystem for HealthEndpoint {
    fn name(&self) -> &str {
        "health"
    }

    async fn start(&mut self) -> Result<(), BoxError> {
        let router = self.router();
        self.server
            .start(router, SequentialRequestId::new(&self.instance_id))
            .await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), BoxError> {
        self.server.stop().await?;
        Ok(())
    }
}
