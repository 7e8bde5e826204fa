// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::ServiceError;

/// All possible errors that can occur in the edqrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'edq init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("no case service configured\n  hint: set [server] url in .edq/config.toml or export EDQ_SERVER_URL")]
    ServerNotConfigured,

    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("action not found: #{0}")]
    ActionNotFound(i64),

    #[error("invalid action type: '{0}'\n  hint: valid types are: CREATE_CASE, UPDATE_TRIAGE, UPDATE_STATUS")]
    InvalidActionType(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("invalid JSON payload: {reason}\n  hint: pass a JSON object, e.g. '{{\"patientId\":\"P1\"}}'")]
    InvalidPayload { reason: String },

    #[error("case service error: {0}")]
    Service(#[from] ServiceError),

    #[error("sync incomplete: {succeeded} synced, {failed} failed")]
    SyncIncomplete { succeeded: usize, failed: usize },

    #[error("queue is in use by another edq process: {0}\n  hint: only one station process may sync or purge a queue at a time")]
    QueueLocked(String),

    #[error("queue store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("corrupted data in queue: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for edqrs operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<edq_core::Error> for Error {
    fn from(e: edq_core::Error) -> Self {
        match e {
            edq_core::Error::ActionNotFound(id) => Error::ActionNotFound(id),
            edq_core::Error::InvalidActionType(s) => Error::InvalidActionType(s),
            e @ (edq_core::Error::MissingCaseId { .. }
            | edq_core::Error::UnexpectedCaseId(_)
            | edq_core::Error::InvalidActionId(_)
            | edq_core::Error::InvalidCaseRef(_)
            | edq_core::Error::UnknownLocalCase(_)
            | edq_core::Error::InvalidPayload { .. }) => Error::InvalidAction(e.to_string()),
            edq_core::Error::Database(e) => Error::Database(e),
            edq_core::Error::Io(e) => Error::Io(e),
            edq_core::Error::Json(e) => Error::Json(e),
            edq_core::Error::CorruptedData(s) => Error::CorruptedData(s),
            edq_core::Error::StoreUnavailable(s) => Error::StoreUnavailable(s),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
