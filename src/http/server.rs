//! HTTP server setup and lifetime.
//!
//! # Responsibilities
//! - Bind a listener and serve an Axum router on a background task
//! - Wire up the shared middleware (tracing, timeout, request ID)
//! - Stop gracefully and wait for the serving task to finish

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::http::request::SequentialRequestId;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("{0} server is already running")]
    AlreadyRunning(&'static str),

    #[error("server task failed: {0}")]
    Join(#[from] JoinError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

struct Running {
    local_addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

/// An HTTP endpoint that can be started once and stopped gracefully.
pub struct HttpServer {
    name: &'static str,
    addr: SocketAddr,
    request_timeout: Duration,
    running: Option<Running>,
}

impl HttpServer {
    /// Create a server that will bind `addr` when started.
    pub fn new(name: &'static str, addr: SocketAddr, request_timeout: Duration) -> Self {
        Self {
            name,
            addr,
            request_timeout,
            running: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bound address while running. Differs from the configured one for port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Bind and start serving `router` in the background.
    pub async fn start(
        &mut self,
        router: Router,
        request_ids: SequentialRequestId,
    ) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyRunning(self.name));
        }

        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;
        let app = Self::build_router(router, request_ids, self.request_timeout);

        let (stop, stopped) = oneshot::channel::<()>();
        let name = self.name;
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stopped.await;
                })
                .await?;
            tracing::debug!(server = name, "HTTP server task finished");
            Ok(())
        });

        tracing::info!(server = self.name, address = %local_addr, "HTTP server listening");
        self.running = Some(Running {
            local_addr,
            stop,
            task,
        });
        Ok(local_addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    ///
    /// Does nothing if the server is not running.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        let _ = running.stop.send(());
        running.task.await??;
        tracing::info!(server = self.name, address = %running.local_addr, "HTTP server stopped");
        Ok(())
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(router: Router, request_ids: SequentialRequestId, timeout: Duration) -> Router {
        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(request_ids))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(timeout)),
        )
    }
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("name", &self.name)
            .field("addr", &self.addr)
            .field("local_addr", &self.local_addr())
            .finish()
    }
}
