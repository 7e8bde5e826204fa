// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod board;
pub mod init;
pub mod pending;
pub mod purge;
pub mod retry;
pub mod state;
pub mod submit;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
pub mod watch;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use edq_core::QueueStore;
use fs2::FileExt;

use crate::config::{find_work_dir_from, get_queue_path, Config};
use crate::env;
use crate::error::{Error, Result};
use crate::sync::{Downtime, HttpCaseService, HttpProbe, NetworkMonitor};
use crate::timings::{CallLog, TimedService};

/// An initialized station: its config and a lazily opened queue.
pub struct Station {
    pub work_dir: PathBuf,
    pub config: Config,
    pub queue_path: PathBuf,
    pub store: Arc<QueueStore>,
    /// Timings of the case service calls made by this command.
    pub calls: CallLog,
}

/// Helper to open the station from the current context.
pub fn open_station() -> Result<Station> {
    open_station_at(&std::env::current_dir()?)
}

/// Open the station whose `.edq/` is at or above `start`.
///
/// `EDQ_QUEUE` overrides the configured queue path.
pub fn open_station_at(start: &Path) -> Result<Station> {
    let work_dir = find_work_dir_from(start)?;
    let config = Config::load(&work_dir)?;
    let queue_path = env::queue_path().unwrap_or_else(|| get_queue_path(&work_dir, &config));
    let store = Arc::new(QueueStore::new(&queue_path));
    Ok(Station {
        work_dir,
        config,
        queue_path,
        store,
        calls: CallLog::new(),
    })
}

impl Station {
    /// Resolved case service URL. `EDQ_SERVER_URL` wins over the config file.
    pub fn server_url(&self) -> Result<String> {
        self.config.server_url(env::server_url())
    }

    /// HTTP client for the configured case service.
    pub fn service(&self) -> Result<HttpCaseService> {
        let url = self.server_url()?;
        Ok(HttpCaseService::new(&url, self.config.server.timeout())?)
    }

    /// Health probe for the configured case service.
    pub fn probe(&self) -> Result<HttpProbe> {
        let url = self.server_url()?;
        Ok(HttpProbe::new(
            &url,
            &self.config.server.health_path,
            self.config.server.timeout(),
        )?)
    }

    /// Downtime controller over the HTTP case service. Calls are timed into
    /// [`Station::calls`].
    pub fn downtime(&self, monitor: NetworkMonitor) -> Result<Downtime> {
        let service = TimedService::new(self.service()?, self.calls.clone());
        Downtime::new(Arc::clone(&self.store), Arc::new(service), monitor)
    }

    /// Take the single-writer lock for this station's queue.
    pub fn lock(&self) -> Result<QueueLock> {
        acquire_lock(&self.queue_path)
    }
}

/// Exclusive lock over a queue file. Released on drop.
#[derive(Debug)]
pub struct QueueLock {
    path: PathBuf,
    _file: File,
}

impl QueueLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lock `<queue>.lock` next to the queue database.
///
/// Only one process may replay or purge a given queue at a time; a second
/// `sync`, `purge` or `watch` fails fast instead of double-sending.
pub fn acquire_lock(queue_path: &Path) -> Result<QueueLock> {
    let path = queue_path.with_extension("lock");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)?;
    file.try_lock_exclusive()
        .map_err(|_| Error::QueueLocked(path.display().to_string()))?;
    Ok(QueueLock { path, _file: file })
}

/// Current-thread runtime for commands that talk to the case service.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))
}
