// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred case-changing actions.
//!
//! An [`ActionRecord`] is one queued intent (register a patient, record a
//! triage level, change case status) waiting to be replayed against the case
//! service. Callers build a [`NewAction`]; only the queue store turns it into a
//! record by assigning the id, timestamp and idempotency key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Prefix of a case reference that points at a queued `CREATE_CASE` action.
pub const LOCAL_REF_PREFIX: &str = "local:";

/// Kind of state-changing operation carried by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Register a new emergency case. The case has no server id yet.
    CreateCase,
    /// Record triage fields on an existing case.
    UpdateTriage,
    /// Change the workflow status of an existing case.
    UpdateStatus,
}

impl ActionType {
    /// All action types, in declaration order.
    pub const ALL: [ActionType; 3] = [
        ActionType::CreateCase,
        ActionType::UpdateTriage,
        ActionType::UpdateStatus,
    ];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateCase => "CREATE_CASE",
            ActionType::UpdateTriage => "UPDATE_TRIAGE",
            ActionType::UpdateStatus => "UPDATE_STATUS",
        }
    }

    /// Returns true if this action targets an existing case.
    pub fn needs_case(&self) -> bool {
        !matches!(self, ActionType::CreateCase)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "CREATE_CASE" => Ok(ActionType::CreateCase),
            "UPDATE_TRIAGE" => Ok(ActionType::UpdateTriage),
            "UPDATE_STATUS" => Ok(ActionType::UpdateStatus),
            _ => Err(Error::InvalidActionType(s.to_string())),
        }
    }
}

/// Store-assigned action identifier. Ascending ids are queue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub i64);

impl ActionId {
    /// The `local:<id>` reference naming the case this action creates.
    pub fn local_ref(&self) -> String {
        format!("{LOCAL_REF_PREFIX}{}", self.0)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for ActionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        digits
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .map(ActionId)
            .ok_or_else(|| Error::InvalidActionId(s.to_string()))
    }
}

/// Target of an update action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseRef {
    /// A case the server already knows.
    Server(String),
    /// A case registered offline by the given `CREATE_CASE` action.
    Local(ActionId),
}

impl CaseRef {
    /// Parse a stored case id.
    pub fn parse(case_id: &str) -> Result<Self> {
        let trimmed = case_id.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidCaseRef(case_id.to_string()));
        }
        match trimmed.strip_prefix(LOCAL_REF_PREFIX) {
            Some(rest) => rest
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .map(|n| CaseRef::Local(ActionId(n)))
                .ok_or_else(|| Error::InvalidCaseRef(case_id.to_string())),
            None => Ok(CaseRef::Server(trimmed.to_string())),
        }
    }
}

impl fmt::Display for CaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseRef::Server(id) => write!(f, "{id}"),
            CaseRef::Local(id) => write!(f, "{}", id.local_ref()),
        }
    }
}

/// An action as submitted by a caller, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub data: Value,
}

impl NewAction {
    /// Register a new case with the given patient/case fields.
    pub fn create_case(data: Value) -> Self {
        NewAction {
            action_type: ActionType::CreateCase,
            case_id: None,
            data,
        }
    }

    /// Record triage fields on a case.
    pub fn update_triage(case_id: impl Into<String>, data: Value) -> Self {
        NewAction {
            action_type: ActionType::UpdateTriage,
            case_id: Some(case_id.into()),
            data,
        }
    }

    /// Change a case's status.
    pub fn update_status(case_id: impl Into<String>, status: impl Into<String>) -> Self {
        NewAction {
            action_type: ActionType::UpdateStatus,
            case_id: Some(case_id.into()),
            data: serde_json::json!({ "status": status.into() }),
        }
    }

    /// Check that the case reference and payload fit the action type.
    pub fn validate(&self) -> Result<()> {
        match (self.action_type.needs_case(), self.case_id.as_deref()) {
            (false, Some(case_id)) => return Err(Error::UnexpectedCaseId(case_id.to_string())),
            (true, None) => {
                return Err(Error::MissingCaseId {
                    action_type: self.action_type.to_string(),
                })
            }
            (true, Some(case_id)) => {
                CaseRef::parse(case_id)?;
            }
            (false, None) => {}
        }

        if !self.data.is_object() {
            return Err(Error::InvalidPayload {
                action_type: self.action_type.to_string(),
                reason: "data must be a JSON object".to_string(),
            });
        }

        if self.action_type == ActionType::UpdateStatus && status_of(&self.data).is_none() {
            return Err(Error::InvalidPayload {
                action_type: self.action_type.to_string(),
                reason: "missing string field 'status'".to_string(),
            });
        }

        Ok(())
    }

    /// Parsed case reference, if the action targets a case.
    pub fn case_ref(&self) -> Result<Option<CaseRef>> {
        self.case_id.as_deref().map(CaseRef::parse).transpose()
    }
}

/// A queued action as persisted by the queue store.
///
/// `action_type`, `case_id`, `data`, `idempotency_key` and `queued_at` never
/// change after enqueue. Only `synced`/`synced_at` move, and only forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: ActionId,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub data: Value,
    /// Client-generated key the server can use to drop duplicate replays.
    pub idempotency_key: String,
    pub queued_at: DateTime<Utc>,
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl ActionRecord {
    /// Parsed case reference, if the action targets a case.
    pub fn case_ref(&self) -> Result<Option<CaseRef>> {
        self.case_id.as_deref().map(CaseRef::parse).transpose()
    }

    /// The status carried by an `UPDATE_STATUS` payload.
    pub fn status(&self) -> Option<&str> {
        status_of(&self.data)
    }
}

fn status_of(data: &Value) -> Option<&str> {
    data.get("status").and_then(Value::as_str)
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
