//! Docker Engine API lookups over the engine's unix socket.

use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use hyper::client::conn::http1;
use hyper::header::HOST;
use hyper::Request;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::UnixStream;

use crate::host::HostError;

pub const DEFAULT_SOCKET: &str = "/tmp/docker.sock";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct ContainerInspect {
    #[serde(rename = "Name")]
    name: String,
}

/// Name of container `container_id`, without the leading `/`.
pub async fn container_name(socket: &Path, container_id: &str) -> Result<String, HostError> {
    let stream = UnixStream::connect(socket).await?;
    let (mut sender, conn) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| HostError::Docker(e.to_string()))?;
    let connection = tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(error = %e, "Docker connection closed with error");
        }
    });

    let request = Request::builder()
        .method("GET")
        .uri(format!("/containers/{container_id}/json"))
        .header(HOST, "docker")
        .body(Body::empty())
        .map_err(|e| HostError::Docker(e.to_string()))?;

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| HostError::Docker(e.to_string()))?;
    let status = response.status();
    let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES)
        .await
        .map_err(|e| HostError::Docker(e.to_string()))?;
    connection.abort();

    if !status.is_success() {
        return Err(HostError::Docker(format!(
            "inspect {container_id} returned {status}"
        )));
    }
    parse_container_name(&bytes)
}

/// Blocking wrapper for use before the event loop exists.
///
/// Must not be called from inside a tokio runtime.
pub fn container_name_blocking(socket: &Path, container_id: &str) -> Result<String, HostError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        tokio::time::timeout(REQUEST_TIMEOUT, container_name(socket, container_id))
            .await
            .map_err(|_| HostError::Docker("request timed out".to_string()))?
    })
}

fn parse_container_name(body: &[u8]) -> Result<String, HostError> {
    let inspect: ContainerInspect =
        serde_json::from_slice(body).map_err(|e| HostError::Docker(e.to_string()))?;
    let name = inspect.name.trim_start_matches('/');
    if name.is_empty() {
        return Err(HostError::Docker("container has an empty name".to_string()));
    }
    Ok(name.to_string())
}
