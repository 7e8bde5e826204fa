// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `edq new`, `edq triage` and `edq status`.
//!
//! Each builds a [`NewAction`] and hands it to the downtime controller,
//! which calls the case service directly or queues the action. With
//! `--offline` the action is queued without touching the network.

use edq_core::{ActionId, ActionType, NewAction, QueueStore};
use serde_json::Value;

use super::{open_station, runtime};
use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::sync::{NetworkMonitor, Submitted};

pub fn new_case(data: String, offline: bool, format: OutputFormat) -> Result<()> {
    let action = NewAction::create_case(parse_payload(&data)?);
    run(action, offline, format)
}

pub fn triage(case: String, data: String, offline: bool, format: OutputFormat) -> Result<()> {
    let action = NewAction::update_triage(case, parse_payload(&data)?);
    run(action, offline, format)
}

pub fn status(case: String, status: String, offline: bool, format: OutputFormat) -> Result<()> {
    run(NewAction::update_status(case, status), offline, format)
}

fn run(action: NewAction, offline: bool, format: OutputFormat) -> Result<()> {
    action.validate()?;
    let station = open_station()?;

    let outcome = if offline {
        Submitted::Queued {
            id: queue_impl(&station.store, &action)?,
        }
    } else {
        let downtime = station.downtime(NetworkMonitor::new(true))?;
        runtime()?.block_on(downtime.submit(action.clone()))?
    };

    match format {
        OutputFormat::Text => {
            let pending = station.store.count()?;
            println!("{}", format_outcome(action.action_type, &outcome, pending));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }
    Ok(())
}

/// Queue an action without calling the case service.
pub(crate) fn queue_impl(store: &QueueStore, action: &NewAction) -> Result<ActionId> {
    Ok(store.enqueue(action)?)
}

/// Parse a command-line payload. It must be a JSON object.
pub(crate) fn parse_payload(data: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(data).map_err(|e| Error::InvalidPayload {
        reason: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(Error::InvalidPayload {
            reason: "expected a JSON object".to_string(),
        });
    }
    Ok(value)
}

pub(crate) fn format_outcome(action_type: ActionType, outcome: &Submitted, pending: usize) -> String {
    match outcome {
        Submitted::Sent { case } => match action_type {
            ActionType::CreateCase => format!("Created case {}", case.id),
            ActionType::UpdateTriage => format!("Recorded triage for case {}", case.id),
            ActionType::UpdateStatus => format!("Updated status of case {}", case.id),
        },
        Submitted::Queued { id } => {
            let mut line = format!("Queued {} {} ({} pending)", action_type, id, pending);
            if action_type == ActionType::CreateCase {
                line.push_str(&format!("\nRefer to this case as {} until it syncs", id.local_ref()));
            }
            line
        }
    }
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;
