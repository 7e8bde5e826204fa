// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use edq_core::DowntimeState;

use super::{open_station, runtime};
use crate::error::Result;
use crate::sync::NetworkMonitor;

/// Probe the case service once. An unreachable service is not an error.
pub fn run() -> Result<()> {
    let station = open_station()?;
    let downtime = station.downtime(NetworkMonitor::new(false))?;

    let reachable = runtime()?.block_on(downtime.retry_connection());
    println!("{}", format_retry(reachable, &downtime.state()));
    Ok(())
}

pub(crate) fn format_retry(reachable: bool, state: &DowntimeState) -> String {
    match (reachable, state.pending()) {
        (true, 0) => "Case service reachable; station is online".to_string(),
        (true, pending) => format!(
            "Case service reachable; {} action(s) pending, run 'edq sync' to send them",
            pending
        ),
        (false, pending) => format!(
            "Case service unreachable; still in downtime mode ({} pending)",
            pending
        ),
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
