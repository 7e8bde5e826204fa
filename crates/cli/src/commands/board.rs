// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::Value;

use super::{open_station, runtime};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::{Case, NetworkMonitor};

/// Show the server's live board. Not available during downtime.
pub fn run(format: OutputFormat) -> Result<()> {
    let station = open_station()?;
    let downtime = station.downtime(NetworkMonitor::new(true))?;
    let cases = runtime()?.block_on(downtime.live_board())?;

    match format {
        OutputFormat::Text => print!("{}", format_board(&cases)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cases)?),
    }
    Ok(())
}

pub(crate) fn format_board(cases: &[Case]) -> String {
    if cases.is_empty() {
        return "No active cases\n".to_string();
    }

    let mut out = String::new();
    for case in cases {
        let status = case
            .fields
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("-");
        let mut rest = case.fields.clone();
        rest.remove("status");
        out.push_str(&format!(
            "{:<12}{:<16}{}\n",
            case.id,
            status,
            Value::Object(rest)
        ));
    }
    out
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;
