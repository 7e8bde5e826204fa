// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "edq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline action queue for emergency department stations")]
#[command(
    long_about = "Offline action queue for emergency department stations.\n\n\
    Case registrations, triage updates and status changes are sent straight to the \
    case service while it is reachable, and queued locally while it is not. \
    Queued actions replay in order once connectivity returns."
)]
#[command(after_help = "\
Quickstart:
  edq init --server https://his.example.org/api/ed
  edq new '{\"patientId\":\"P1\",\"complaint\":\"chest pain\"}'
  edq pending
  edq sync")]
pub struct Cli {
    /// Run as if edq was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    /// Log debug output to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a station in the current directory
    #[command(after_help = "\
Examples:
  edq init                                    Initialize without a case service
  edq init --server http://10.0.0.5:8080      Initialize and set the case service
  edq init --path /srv/triage                 Initialize in another directory")]
    Init {
        /// Base URL of the case service
        #[arg(long, value_name = "URL")]
        server: Option<String>,

        /// Directory to initialize (default: current directory)
        #[arg(long)]
        path: Option<String>,
    },

    /// Register a new case
    #[command(after_help = "\
Examples:
  edq new '{\"patientId\":\"P1\"}'              Send now, or queue if the service is down
  edq new '{\"patientId\":\"P1\"}' --offline    Queue without trying the service")]
    New {
        /// Case fields as a JSON object
        #[arg(value_parser = non_empty_string)]
        data: String,

        /// Queue the action without calling the case service
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Record triage for a case
    #[command(after_help = "\
Examples:
  edq triage C1042 '{\"level\":2}'              Triage a case known to the service
  edq triage local:3 '{\"level\":2}'            Triage a case still waiting in the queue")]
    Triage {
        /// Case id, or local:<n> for a case registered while offline
        #[arg(value_parser = non_empty_string)]
        case: String,

        /// Triage fields as a JSON object
        #[arg(value_parser = non_empty_string)]
        data: String,

        /// Queue the action without calling the case service
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Change the status of a case
    Status {
        /// Case id, or local:<n> for a case registered while offline
        #[arg(value_parser = non_empty_string)]
        case: String,

        /// New status, e.g. IN_TREATMENT
        #[arg(value_parser = non_empty_string)]
        status: String,

        /// Queue the action without calling the case service
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List queued actions
    Pending {
        /// Include actions that already synced
        #[arg(long, short = 'a')]
        all: bool,

        /// Only show one action type (CREATE_CASE, UPDATE_TRIAGE, UPDATE_STATUS)
        #[arg(long = "type", short = 't')]
        action_type: Option<String>,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Replay queued actions against the case service
    Sync {
        /// Output format
        #[arg(long, short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Probe the case service and leave downtime mode if it answers
    Retry,

    /// Show the station's downtime state
    State {
        /// Output format
        #[arg(long, short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Remove synced actions from the queue
    #[command(after_help = "\
Examples:
  edq purge          Remove actions that already synced
  edq purge --all    Discard every queued action, synced or not")]
    Purge {
        /// Also discard actions that have not synced
        #[arg(long)]
        all: bool,
    },

    /// Show the live board from the case service
    Board {
        /// Output format
        #[arg(long, short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Watch connectivity and sync automatically when it returns
    Watch,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
