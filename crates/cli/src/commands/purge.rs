// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use edq_core::QueueStore;

use super::open_station;
use crate::error::Result;

/// What a purge removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Purged {
    pub removed: usize,
    /// Unsynced actions discarded by `--all`.
    pub discarded: usize,
}

pub fn run(all: bool) -> Result<()> {
    let station = open_station()?;
    let _lock = station.lock()?;

    let purged = run_impl(&station.store, all)?;
    if purged.discarded > 0 {
        eprintln!(
            "warning: discarded {} action(s) that never reached the case service",
            purged.discarded
        );
    }
    if all {
        println!("Removed {} action(s); queue is empty", purged.removed);
    } else {
        println!("Removed {} synced action(s)", purged.removed);
    }
    Ok(())
}

pub(crate) fn run_impl(store: &QueueStore, all: bool) -> Result<Purged> {
    if all {
        let discarded = store.count()?;
        let removed = store.purge_all()?;
        Ok(Purged { removed, discarded })
    } else {
        Ok(Purged {
            removed: store.purge_synced()?,
            discarded: 0,
        })
    }
}

#[cfg(test)]
#[path = "purge_tests.rs"]
mod tests;
