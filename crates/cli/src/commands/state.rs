// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use edq_core::DowntimeState;
use serde::Serialize;

use super::{open_station, runtime, Station};
use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::sync::ConnectivityProbe;

/// The station's state as seen by a fresh process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StationState {
    #[serde(flatten)]
    pub state: DowntimeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    pub reachable: bool,
}

pub fn run(format: OutputFormat) -> Result<()> {
    let station = open_station()?;
    let state = run_impl(&station)?;

    match format {
        OutputFormat::Text => print!("{}", format_state(&state)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
    }
    Ok(())
}

/// Boot the state machine from the queue and one health probe.
pub(crate) fn run_impl(station: &Station) -> Result<StationState> {
    let pending = station.store.count()?;
    let (server, reachable) = match station.probe() {
        Ok(probe) => {
            let reachable = runtime()?.block_on(probe.check());
            (Some(station.server_url()?), reachable)
        }
        Err(Error::ServerNotConfigured) => (None, false),
        Err(e) => return Err(e),
    };

    Ok(StationState {
        state: DowntimeState::boot(pending, reachable),
        server,
        reachable,
    })
}

pub(crate) fn format_state(state: &StationState) -> String {
    let server = match &state.server {
        Some(url) if state.reachable => format!("{} (reachable)", url),
        Some(url) => format!("{} (unreachable)", url),
        None => "not configured".to_string(),
    };
    format!("State: {}\nCase service: {}\n", state.state, server)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
