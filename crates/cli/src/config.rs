// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Station configuration management.
//!
//! Configuration is stored in `.edq/config.toml` and includes:
//! - `queue`: Optional path for the offline queue database
//! - `[server]`: Case service base URL, request timeout and health path
//! - `[monitor]`: Connectivity probe interval for `edq watch`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const WORK_DIR_NAME: &str = ".edq";
const CONFIG_FILE_NAME: &str = "config.toml";
const QUEUE_FILE_NAME: &str = "queue.db";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Station configuration stored in `.edq/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Optional path for the queue database (relative to the station root or absolute).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Case service connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the case service, e.g. `https://his.example.org/api/ed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Path probed by the connectivity monitor (default: "/health").
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            url: None,
            timeout_secs: default_timeout_secs(),
            health_path: default_health_path(),
        }
    }
}

/// Connectivity monitor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between connectivity probes (default: 5).
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_probe_interval_secs() -> u64 {
    5
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl MonitorConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

impl Config {
    /// Creates a config pointing at the given case service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidServerUrl`] if the URL is not http(s).
    pub fn with_server(url: &str) -> Result<Self> {
        validate_server_url(url)?;
        Ok(Config {
            server: ServerConfig {
                url: Some(url.trim_end_matches('/').to_string()),
                ..ServerConfig::default()
            },
            ..Config::default()
        })
    }

    /// Loads configuration from the given `.edq/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Saves configuration to the given `.edq/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Resolves the case service URL. An environment override wins over the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServerNotConfigured`] when neither source sets a URL.
    pub fn server_url(&self, env_override: Option<String>) -> Result<String> {
        let url = env_override
            .or_else(|| self.server.url.clone())
            .ok_or(Error::ServerNotConfigured)?;
        validate_server_url(&url)?;
        Ok(url.trim_end_matches('/').to_string())
    }
}

/// Checks that a case service URL is absolute http or https.
pub fn validate_server_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url).map_err(|e| Error::InvalidServerUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::InvalidServerUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}', expected http or https", other),
        }),
    }
}

/// Find the .edq directory by walking up from the current directory
pub fn find_work_dir() -> Result<PathBuf> {
    find_work_dir_from(&std::env::current_dir()?)
}

/// Find the .edq directory by walking up from `start`
pub fn find_work_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.is_dir() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Get the queue database path from config
pub fn get_queue_path(work_dir: &Path, config: &Config) -> PathBuf {
    match &config.queue {
        Some(queue) => {
            let queue_path = Path::new(queue);
            if queue_path.is_absolute() {
                queue_path.to_path_buf()
            } else {
                // Relative to work_dir's parent (the station root)
                work_dir.parent().unwrap_or(work_dir).join(queue)
            }
        }
        None => work_dir.join(QUEUE_FILE_NAME),
    }
}

/// Initialize a new .edq directory at the given path
pub fn init_work_dir(path: &Path, server: Option<&str>) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    let config = match server {
        Some(url) => Config::with_server(url)?,
        None => Config::default(),
    };

    fs::create_dir_all(&work_dir)?;
    config.save(&work_dir)?;
    write_gitignore(&work_dir)?;

    Ok(work_dir)
}

/// Write a .gitignore file to the work directory.
///
/// The queue holds patient data and never belongs in version control.
pub fn write_gitignore(work_dir: &Path) -> Result<()> {
    let gitignore_path = work_dir.join(GITIGNORE_FILE_NAME);
    let content = "# Offline queue (patient data)\nqueue.db\nqueue.db-*\n*.lock\n";
    fs::write(&gitignore_path, content)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
