//! Resilience helpers for calls to external collaborators.
//!
//! # Design Decisions
//! - Only the coordination client retries; subsystem startup as a whole is
//!   never retried
//! - Retries are bounded and jittered

pub mod backoff;

pub use backoff::{calculate_backoff, RetryPolicy};
