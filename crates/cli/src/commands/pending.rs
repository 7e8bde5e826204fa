// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use edq_core::{ActionRecord, ActionType, QueueStore};

use super::open_station;
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(all: bool, action_type: Option<String>, format: OutputFormat) -> Result<()> {
    let station = open_station()?;
    let records = run_impl(&station.store, all, action_type.as_deref())?;

    match format {
        OutputFormat::Text => print!("{}", format_records(&records)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

/// Queued records in queue order. Synced records only with `all`.
pub(crate) fn run_impl(
    store: &QueueStore,
    all: bool,
    action_type: Option<&str>,
) -> Result<Vec<ActionRecord>> {
    let action_type = action_type
        .map(|t| t.trim().to_ascii_uppercase().parse::<ActionType>())
        .transpose()?;

    let mut records = match action_type {
        Some(action_type) => store.list_by_type(action_type)?,
        None if all => store.list_all()?,
        None => store.list_pending()?,
    };
    if !all {
        records.retain(|r| !r.synced);
    }
    Ok(records)
}

pub(crate) fn format_records(records: &[ActionRecord]) -> String {
    if records.is_empty() {
        return "No queued actions\n".to_string();
    }

    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "{:<6}{:<15}{:<12}{}  {}{}\n",
            record.id.to_string(),
            record.action_type.as_str(),
            record.case_id.as_deref().unwrap_or("-"),
            record.queued_at.format("%Y-%m-%d %H:%M:%S"),
            record.data,
            if record.synced { "  (synced)" } else { "" },
        ));
    }
    let pending = records.iter().filter(|r| !r.synced).count();
    out.push_str(&format!("{} pending\n", pending));
    out
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
