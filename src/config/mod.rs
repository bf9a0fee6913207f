//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (+ host identity lookups)
//!     → file top-level values   (loader.rs, TOML)
//!     → flags or their env vars (cli.rs, clap `env`)
//!     → HOSTNAME, RUST_LOG      (env.rs)
//!     → container-name override (post-processing)
//!     → validation.rs
//!     → Settings (immutable, cloned into every subsystem)
//! ```
//!
//! # Design Decisions
//! - Settings is built once at process entry and never mutated
//! - The environment is read once at entry, by clap and `Environment::capture`;
//!   nothing reads it later
//! - Structured sections of the file (`[logging]`, `[heartbeat]`,
//!   `[lifecycle]`) are taken as-is, not layered

pub mod cli;
pub mod env;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use env::Environment;
pub use loader::ConfigError;
pub use resolver::{resolve, Defaults};
pub use schema::{FileConfig, LogFormat, LoggingConfig, Settings};
