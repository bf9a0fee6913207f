//! Northbound RPC server.
//!
//! JSON over HTTP. Exposes the identity of this instance and a serving
//! status.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::http::{HttpServer, SequentialRequestId};
use crate::lifecycle::{BoxError, Subsystem};
use crate::subsystems::REQUEST_TIMEOUT;

/// Body of `GET /api/v1/instance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub instance_id: String,
    pub internal_host_address: String,
    pub external_host_address: String,
    pub interface: String,
    pub rest_port: u16,
    pub grpc_port: u16,
}

impl InstanceInfo {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            instance_id: settings.instance_id.clone(),
            internal_host_address: settings.internal_host_address.clone(),
            external_host_address: settings.external_host_address.clone(),
            interface: settings.interface.clone(),
            rest_port: settings.rest_port,
            grpc_port: settings.grpc_port,
        }
    }
}

/// Body of `GET /api/v1/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingStatus {
    pub status: String,
}

pub struct RpcServer {
    info: Arc<InstanceInfo>,
    server: HttpServer,
}

impl RpcServer {
    pub fn new(settings: &Settings) -> Self {
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.grpc_port));
        Self {
            info: Arc::new(InstanceInfo::from_settings(settings)),
            server: HttpServer::new("rpc", addr, REQUEST_TIMEOUT),
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/v1/instance", get(instance))
            .route("/api/v1/health", get(serving))
            .with_state(Arc::clone(&self.info))
    }
}

async fn instance(State(info): State<Arc<InstanceInfo>>) -> Json<InstanceInfo> {
    Json(info.as_ref().clone())
}

async fn serving() -> Json<ServingStatus> {
    Json(ServingStatus {
        status: "serving".to_string(),
    })
}

#[async_trait]
impl Subsystem for RpcServer {
    fn name(&self) -> &str {
        "rpc"
    }

    async fn start(&mut self) -> Result<(), BoxError> {
        let router = self.router();
        self.server
            .start(router, SequentialRequestId::new(&self.info.instance_id))
            .await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), BoxError> {
        self.server.stop().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::X_REQUEST_ID;

    #[tokio::test]
    async fn test_instance_and_health_routes() {
        let mut settings = Settings::local("r9");
        settings.grpc_port = 0;
        let mut rpc = RpcServer::new(&settings);
        rpc.start().await.unwrap();
        let port = rpc.local_addr().unwrap().port();
        let client = reqwest::Client::builder().no_proxy().build().unwrap();

        let response = client
            .get(format!("http://127.0.0.1:{port}/api/v1/instance"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "r9-1");
        let info: InstanceInfo = response.json().await.unwrap();
        assert_eq!(info.instance_id, "r9");
        assert_eq!(info.rest_port, 8880);

        let status: ServingStatus = client
            .get(format!("http://127.0.0.1:{port}/api/v1/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status.status, "serving");

        rpc.shutdown().await.unwrap();
    }
}
