//! Request id generation.
//!
//! # Responsibilities
//! - Assign an `x-request-id` to every request that arrives without one
//! - Keep ids unique per process and traceable to the instance
//!
//! # Design Decisions
//! - Ids are `<instance>-<sequence>`; no random component is needed
//!   because the instance id is unique within the cluster
//! - An id supplied by the client is kept as-is

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Produces `<prefix>-<n>` request ids. Clones share the counter.
#[derive(Debug, Clone)]
pub struct SequentialRequestId {
    prefix: Arc<str>,
    next: Arc<AtomicU64>,
}

impl SequentialRequestId {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: Arc::from(prefix),
            next: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl MakeRequestId for SequentialRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        HeaderValue::from_str(&format!("{}-{n}", self.prefix))
            .ok()
            .map(RequestId::new)
    }
}
