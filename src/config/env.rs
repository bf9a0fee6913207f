//! Environment lookups that are not a flag of their own.
//!
//! Flag-backed variables are read by clap while parsing
//! [`Cli`](crate::config::Cli).

/// Environment values captured once at process entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Instance id fallback after `INSTANCE_ID`.
    pub hostname: Option<String>,
    /// Replaces the computed log filter when present.
    pub rust_log: Option<String>,
}

impl Environment {
    pub fn capture() -> Self {
        Self {
            hostname: var("HOSTNAME"),
            rust_log: var("RUST_LOG"),
        }
    }
}

/// Value of `key`; empty and non-UTF-8 values count as unset.
fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
