// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for edq-core operations.

use thiserror::Error;

/// All possible errors that can occur in edq-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("action not found: #{0}")]
    ActionNotFound(i64),

    #[error("invalid action type: '{0}'\n  hint: valid types are: CREATE_CASE, UPDATE_TRIAGE, UPDATE_STATUS")]
    InvalidActionType(String),

    #[error("{action_type} requires a case id\n  hint: pass the server case id or local:<action id>")]
    MissingCaseId { action_type: String },

    #[error("CREATE_CASE must not carry a case id (got '{0}')")]
    UnexpectedCaseId(String),

    #[error("invalid action id: '{0}'")]
    InvalidActionId(String),

    #[error("invalid case reference: '{0}'\n  hint: use a server case id or local:<action id>")]
    InvalidCaseRef(String),

    #[error("local case reference '{0}' does not name a queued CREATE_CASE action")]
    UnknownLocalCase(String),

    #[error("invalid payload for {action_type}: {reason}")]
    InvalidPayload { action_type: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("queue store unavailable: {0}")]
    StoreUnavailable(String),
}

/// A specialized Result type for edq-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
