//! HTTP serving shared by the health endpoint and the RPC server.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign request ID when missing)
//!     → subsystem router (health / rpc handlers)
//!     → response with x-request-id echoed
//! ```

pub mod request;
pub mod server;

pub use request::{SequentialRequestId, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
