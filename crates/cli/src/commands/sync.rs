// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use edq_core::SyncReport;

use super::{open_station, runtime};
use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::sync::{Downtime, NetworkMonitor, SyncOutcome};

pub fn run(format: OutputFormat) -> Result<()> {
    let station = open_station()?;
    let _lock = station.lock()?;
    let downtime = station.downtime(NetworkMonitor::new(true))?;

    let outcome = runtime()?.block_on(run_impl(&downtime))?;
    station.calls.print_summary("sync");
    finish(outcome, format)
}

pub(crate) async fn run_impl(downtime: &Downtime) -> Result<SyncOutcome> {
    downtime.sync_with_server().await
}

/// Print the outcome. A run with failures exits non-zero.
pub(crate) fn finish(outcome: SyncOutcome, format: OutputFormat) -> Result<()> {
    let report = match outcome {
        SyncOutcome::Completed(report) => report,
        SyncOutcome::AlreadyRunning => {
            println!("Sync already running");
            return Ok(());
        }
    };

    match format {
        OutputFormat::Text => print!("{}", format_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(Error::SyncIncomplete {
            succeeded: report.success,
            failed: report.failed,
        })
    }
}

pub(crate) fn format_report(report: &SyncReport) -> String {
    if report.attempted() == 0 {
        return "Nothing to sync\n".to_string();
    }

    let mut out = format!("Synced {} of {} action(s)\n", report.success, report.attempted());
    for failure in &report.errors {
        out.push_str(&format!(
            "  {} {} [{}]: {}\n",
            failure.id, failure.action_type, failure.kind, failure.error
        ));
    }
    if report.purged > 0 {
        out.push_str(&format!("Purged {} synced action(s)\n", report.purged));
    }
    if report.rejected().next().is_some() {
        out.push_str(
            "Rejected actions stay queued; fix them on the server or discard with 'edq purge --all'\n",
        );
    }
    out
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
