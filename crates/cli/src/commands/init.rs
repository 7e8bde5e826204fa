// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use edq_core::QueueStore;

use crate::config::{get_queue_path, init_work_dir, Config};
use crate::error::Result;

pub fn run(server: Option<String>, path: Option<String>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };

    let (work_dir, config) = run_impl(&target_path, server.as_deref())?;

    println!("Initialized station at {}", work_dir.display());
    println!("Queue: {}", get_queue_path(&work_dir, &config).display());
    match &config.server.url {
        Some(url) => println!("Case service: {}", url),
        None => println!(
            "Case service: not configured (set [server] url in {} or export EDQ_SERVER_URL)",
            work_dir.join("config.toml").display()
        ),
    }

    Ok(())
}

/// Create `.edq/` under `target` and an empty, migrated queue.
pub(crate) fn run_impl(target: &Path, server: Option<&str>) -> Result<(PathBuf, Config)> {
    let work_dir = init_work_dir(target, server)?;
    let config = Config::load(&work_dir)?;

    // Opening the store creates the file and runs migrations
    let store = QueueStore::new(&get_queue_path(&work_dir, &config));
    store.count()?;
    store.close();

    Ok((work_dir, config))
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
