// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `edq watch`: keep a station in sync until interrupted.
//!
//! A polling task probes the case service and feeds the network monitor.
//! Each time connectivity comes back the queue is replayed. While online,
//! actions queued by other `edq` processes are picked up on the next tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::{open_station, runtime};
use crate::error::{Error, Result};
use crate::sync::{ConnectivityEvent, ConnectivityProbe, Downtime, NetworkMonitor, SyncOutcome};

pub fn run() -> Result<()> {
    let station = open_station()?;
    let lock = station.lock()?;
    tracing::debug!(lock = %lock.path().display(), "queue locked");
    let probe: Arc<dyn ConnectivityProbe> = Arc::new(station.probe()?);
    let interval = station.config.monitor.probe_interval();

    runtime()?.block_on(async {
        let online = probe.check().await;
        let downtime = station.downtime(NetworkMonitor::new(online))?;
        println!(
            "Watching {} every {}s for {} (Ctrl-C to stop)",
            station.server_url()?,
            interval.as_secs(),
            station.work_dir.display()
        );
        println!("State: {}", downtime.state());

        let runs = watch_impl(&downtime, probe, interval, shutdown_signal()).await?;
        println!("Stopped after {} sync run(s)", runs);
        station.calls.print_summary("watch");
        drop(lock);
        Ok::<(), Error>(())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Run until `shutdown` resolves. Returns the number of sync runs.
pub(crate) async fn watch_impl<F>(
    downtime: &Downtime,
    probe: Arc<dyn ConnectivityProbe>,
    interval: Duration,
    shutdown: F,
) -> Result<usize>
where
    F: Future<Output = ()>,
{
    let (tx, mut events) = mpsc::unbounded_channel();
    let restored = tx.clone();
    let _listeners = downtime.add_network_listeners(
        move || {
            let _ = restored.send(ConnectivityEvent::Restored);
        },
        move || {
            let _ = tx.send(ConnectivityEvent::Lost);
        },
    );
    let poller = downtime.monitor().spawn_polling(probe, interval);

    let mut runs = 0;
    // Pending count left behind by the last run; rejected actions stay
    // queued and must not trigger a replay every tick.
    let mut settled = 0;
    if downtime.is_online() && downtime.pending_count()? > 0 {
        settled = sync_once(downtime).await?;
        runs += 1;
    }

    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let runs = loop {
        tokio::select! {
            _ = &mut shutdown => break runs,
            event = events.recv() => match event {
                Some(ConnectivityEvent::Restored) => {
                    println!("Connectivity restored");
                    if downtime.pending_count()? > 0 {
                        settled = sync_once(downtime).await?;
                        runs += 1;
                    }
                }
                Some(ConnectivityEvent::Lost) => {
                    println!("Connectivity lost; new actions will be queued");
                }
                None => break runs,
            },
            _ = tick.tick() => {
                if downtime.is_online() && downtime.pending_count()? > settled {
                    settled = sync_once(downtime).await?;
                    runs += 1;
                }
            }
        }
    };

    poller.stop().await;
    Ok(runs)
}

/// Replay the queue once and print the report. Returns what is left pending.
async fn sync_once(downtime: &Downtime) -> Result<usize> {
    if let SyncOutcome::Completed(report) = downtime.sync_with_server().await? {
        print!("{}", super::sync::format_report(&report));
    }
    downtime.pending_count()
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
