// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions.

use std::path::PathBuf;

/// Environment variable names.
pub mod vars {
    /// Print case service call timings to stderr.
    pub const EDQ_TIMINGS: &str = "EDQ_TIMINGS";
    /// Case service base URL, overriding `[server] url`.
    pub const EDQ_SERVER_URL: &str = "EDQ_SERVER_URL";
    /// Queue database path, overriding the configured one.
    pub const EDQ_QUEUE: &str = "EDQ_QUEUE";
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Returns `true` if `EDQ_TIMINGS` is set (any value).
pub fn edq_timings() -> bool {
    std::env::var(vars::EDQ_TIMINGS).is_ok()
}

/// Returns the value of `EDQ_SERVER_URL` if set and non-empty.
pub fn server_url() -> Option<String> {
    std::env::var(vars::EDQ_SERVER_URL)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Returns the value of `EDQ_QUEUE` if set.
pub fn queue_path() -> Option<PathBuf> {
    std::env::var(vars::EDQ_QUEUE).ok().map(PathBuf::from)
}

/// Returns `true` if `RUST_LOG` is set, so log filtering is left to it.
pub fn rust_log_set() -> bool {
    std::env::var(vars::RUST_LOG).is_ok()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
