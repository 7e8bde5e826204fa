// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! edqrs - offline action queue for emergency department stations.
//!
//! This crate provides the `edq` CLI: it keeps case registrations, triage
//! updates and status changes flowing to the hospital case service, and
//! queues them locally in SQLite while the service is unreachable.
//!
//! # Main Components
//!
//! - [`Config`] - Station configuration (case service URL, timeouts, queue path)
//! - [`sync`] - Case service client, sync coordinator, network monitor and the
//!   [`Downtime`](sync::Downtime) controller that ties them together
//! - [`Error`] - Error types for all operations
//!
//! # Initialization
//!
//! Use [`init_work_dir`] to create a new `.edq/` directory, then open the queue:
//!
//! ```rust,ignore
//! use edqrs::{find_work_dir, get_queue_path, init_work_dir, Config};
//! use edq_core::QueueStore;
//!
//! // Initialize a new station
//! let work_dir = init_work_dir(Path::new("."), Some("http://his.local/api"))?;
//!
//! // Later, find and open an existing station
//! let work_dir = find_work_dir()?;
//! let config = Config::load(&work_dir)?;
//! let store = QueueStore::new(&get_queue_path(&work_dir, &config));
//! ```

mod cli;
mod commands;

pub mod config;
pub mod env;
pub mod error;
pub mod sync;
pub mod timings;

pub use cli::{Cli, Command, OutputFormat};
pub use config::{find_work_dir, get_queue_path, init_work_dir, Config};
pub use error::{Error, Result};

use tracing_subscriber::EnvFilter;

/// Default log filter for a command. `--verbose` beats `RUST_LOG`.
fn log_filter(verbose: bool, command: &Command) -> EnvFilter {
    if verbose {
        return EnvFilter::new("warn,edqrs=debug,edq_core=debug");
    }
    let default = match command {
        Command::Watch => "warn,edqrs=info,edq_core=info",
        _ => "warn",
    };
    if env::rust_log_set() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    } else {
        EnvFilter::new(default)
    }
}

/// Install the stderr log subscriber. Later calls are no-ops.
pub fn init_logging(verbose: bool, command: &Command) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, command))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)?;
    }
    run_command(cli.command)
}

/// Route a command to its implementation.
pub fn run_command(command: Command) -> Result<()> {
    match command {
        Command::Init { server, path } => commands::init::run(server, path),
        Command::New {
            data,
            offline,
            output,
        } => commands::submit::new_case(data, offline, output),
        Command::Triage {
            case,
            data,
            offline,
            output,
        } => commands::submit::triage(case, data, offline, output),
        Command::Status {
            case,
            status,
            offline,
            output,
        } => commands::submit::status(case, status, offline, output),
        Command::Pending {
            all,
            action_type,
            output,
        } => commands::pending::run(all, action_type, output),
        Command::Sync { output } => commands::sync::run(output),
        Command::Retry => commands::retry::run(),
        Command::State { output } => commands::state::run(output),
        Command::Purge { all } => commands::purge::run(all),
        Command::Board { output } => commands::board::run(output),
        Command::Watch => commands::watch::run(),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
