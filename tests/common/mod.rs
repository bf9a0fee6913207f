//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::put,
    Router,
};
use tokio::net::TcpListener;

use service_host::config::Settings;
use service_host::host::{HostError, HostIdentity};

/// One request received by the mock Consul agent.
#[derive(Debug, Clone)]
pub struct AgentCall {
    pub path: String,
    pub body: Option<serde_json::Value>,
}

/// Requests received by the mock agent, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct AgentLog(Arc<Mutex<Vec<AgentCall>>>);

impl AgentLog {
    pub fn calls(&self) -> Vec<AgentCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    fn push(&self, call: AgentCall) {
        self.0.lock().unwrap().push(call);
    }
}

/// Start a mock Consul agent on an ephemeral port.
pub async fn start_mock_consul() -> (SocketAddr, AgentLog) {
    let log = AgentLog::default();

    async fn register(State(log): State<AgentLog>, body: Bytes) -> StatusCode {
        log.push(AgentCall {
            path: "/v1/agent/service/register".to_string(),
            body: serde_json::from_slice(&body).ok(),
        });
        StatusCode::OK
    }

    async fn deregister(State(log): State<AgentLog>, Path(id): Path<String>) -> StatusCode {
        log.push(AgentCall {
            path: format!("/v1/agent/service/deregister/{id}"),
            body: None,
        });
        StatusCode::OK
    }

    let app = Router::new()
        .route("/v1/agent/service/register", put(register))
        .route("/v1/agent/service/deregister/{id}", put(deregister))
        .with_state(log.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, log)
}

/// Settings on loopback with the given ports and agent.
pub fn settings(instance_id: &str, consul: SocketAddr, rest_port: u16, grpc_port: u16) -> Settings {
    let mut settings = Settings::local(instance_id);
    settings.consul = consul.to_string();
    settings.rest_port = rest_port;
    settings.grpc_port = grpc_port;
    settings.shutdown_timeout = Duration::from_secs(5);
    settings
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Whether something accepts connections on `127.0.0.1:port`.
pub async fn is_listening(port: u16) -> bool {
    tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok()
}

/// Host identity with fixed answers.
pub struct FakeHost {
    pub container: Option<&'static str>,
}

impl HostIdentity for FakeHost {
    fn primary_interface(&self) -> String {
        "eth1".to_string()
    }

    fn primary_local_ipv4(&self) -> String {
        "192.168.10.4".to_string()
    }

    fn container_name(&self) -> Result<String, HostError> {
        self.container
            .map(str::to_string)
            .ok_or(HostError::NoContainerId)
    }
}
