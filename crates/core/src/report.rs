// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome of one sync run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::action::{ActionId, ActionType};

/// Why a queued action could not be replayed.
///
/// Every kind leaves the action queued; the kind only tells the operator
/// whether retrying can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Server unreachable or transiently failing.
    Network,
    /// Server refused the payload.
    Rejected,
    /// Targets a case registered offline whose creation has not synced.
    Dependency,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Rejected => "rejected",
            FailureKind::Dependency => "dependency",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failed action in a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub id: ActionId,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub error: String,
    pub kind: FailureKind,
}

/// Per-run tally. Partial success is a normal outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<SyncFailure>,
    /// Synced records removed after a fully successful run.
    #[serde(default)]
    pub purged: usize,
}

impl SyncReport {
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_failure(
        &mut self,
        id: ActionId,
        action_type: ActionType,
        kind: FailureKind,
        error: impl Into<String>,
    ) {
        self.failed += 1;
        self.errors.push(SyncFailure {
            id,
            action_type,
            error: error.into(),
            kind,
        });
    }

    /// True when no action failed.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// Number of actions the run attempted.
    pub fn attempted(&self) -> usize {
        self.success + self.failed
    }

    /// Failures the server refused outright. Retrying these will not help.
    pub fn rejected(&self) -> impl Iterator<Item = &SyncFailure> {
        self.errors
            .iter()
            .filter(|e| e.kind == FailureKind::Rejected)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} synced, {} failed", self.success, self.failed)
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
