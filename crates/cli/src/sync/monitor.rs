// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network connectivity monitoring.
//!
//! The monitor turns connectivity changes into `on_restored` / `on_lost`
//! callbacks. Changes come from two sources: a background probe task
//! (advisory) and case service calls failing with a network error
//! (authoritative).

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::service::ServiceError;

/// A connectivity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Restored,
    Lost,
}

type Callback = Box<dyn Fn() + Send + Sync>;

struct Listener {
    on_restored: Callback,
    on_lost: Callback,
}

struct Shared {
    online: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Arc<Listener>>>,
}

impl Shared {
    fn listeners(&self) -> MutexGuard<'_, BTreeMap<u64, Arc<Listener>>> {
        // A panicking callback runs outside the lock, so poisoning leaves the map intact
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Connectivity state shared between the probe task and callers.
///
/// Cloning yields another handle to the same monitor.
#[derive(Clone)]
pub struct NetworkMonitor {
    shared: Arc<Shared>,
}

impl NetworkMonitor {
    pub fn new(initial_online: bool) -> Self {
        NetworkMonitor {
            shared: Arc::new(Shared {
                online: AtomicBool::new(initial_online),
                next_id: AtomicU64::new(0),
                listeners: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Last known connectivity.
    pub fn is_online(&self) -> bool {
        self.shared.online.load(Ordering::Acquire)
    }

    /// Register a pair of callbacks. They stay registered until the returned
    /// guard is cleaned up or dropped.
    pub fn add_listeners<R, L>(&self, on_restored: R, on_lost: L) -> ListenerGuard
    where
        R: Fn() + Send + Sync + 'static,
        L: Fn() + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let listener = Arc::new(Listener {
            on_restored: Box::new(on_restored),
            on_lost: Box::new(on_lost),
        });
        self.shared.listeners().insert(id, listener);
        tracing::trace!(id, "network listeners added");

        ListenerGuard {
            shared: Arc::downgrade(&self.shared),
            id: Some(id),
        }
    }

    /// Number of registered listener pairs.
    pub fn listener_count(&self) -> usize {
        self.shared.listeners().len()
    }

    /// Record a connectivity change and notify every listener once.
    ///
    /// Events are not deduplicated: two `Lost` events call `on_lost` twice.
    pub fn emit(&self, event: ConnectivityEvent) {
        self.shared
            .online
            .store(event == ConnectivityEvent::Restored, Ordering::Release);

        // Snapshot so callbacks may add or remove listeners
        let listeners: Vec<Arc<Listener>> = self.shared.listeners().values().cloned().collect();
        tracing::debug!(?event, listeners = listeners.len(), "connectivity event");

        for listener in listeners {
            match event {
                ConnectivityEvent::Restored => (listener.on_restored)(),
                ConnectivityEvent::Lost => (listener.on_lost)(),
            }
        }
    }

    /// Emit only if `online` differs from the last known state.
    ///
    /// Returns true if an event was emitted.
    pub fn update(&self, online: bool) -> bool {
        if self.is_online() == online {
            return false;
        }
        self.emit(if online {
            ConnectivityEvent::Restored
        } else {
            ConnectivityEvent::Lost
        });
        true
    }

    /// Feed a failed case service call into the monitor. Network errors mean
    /// the server is unreachable regardless of what the probe last saw.
    pub fn report_call_outcome(&self, error: &ServiceError) {
        if error.is_network() {
            self.update(false);
        }
    }

    /// Feed a successful case service call into the monitor.
    pub fn report_call_success(&self) {
        self.update(true);
    }

    /// Spawn a background task that probes connectivity every `interval`
    /// and emits on transitions.
    pub fn spawn_polling(
        &self,
        probe: Arc<dyn ConnectivityProbe>,
        interval: Duration,
    ) -> PollingHandle {
        let monitor = self.clone();
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        let task = tokio::spawn(async move {
            loop {
                let online = tokio::select! {
                    _ = token.cancelled() => return,
                    online = probe.check() => online,
                };
                if monitor.update(online) {
                    tracing::info!(online, "connectivity changed");
                }

                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        PollingHandle {
            cancel_token,
            task: Some(task),
        }
    }
}

/// Detaches a listener pair when cleaned up or dropped.
#[must_use = "listeners are removed when the guard is dropped"]
pub struct ListenerGuard {
    shared: Weak<Shared>,
    id: Option<u64>,
}

impl ListenerGuard {
    /// Remove the listeners now.
    pub fn cleanup(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let (Some(id), Some(shared)) = (self.id.take(), self.shared.upgrade()) {
            shared.listeners().remove(&id);
            tracing::trace!(id, "network listeners removed");
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Handle to the background probe task. Dropping it cancels the task.
pub struct PollingHandle {
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollingHandle {
    /// Cancel the probe task and wait for it to finish.
    pub async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Connectivity check used by the probe task.
pub trait ConnectivityProbe: Send + Sync {
    /// Returns true if the case service is reachable.
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Probes a health URL with a GET. Any answer below 500 counts as reachable.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(base_url: &str, health_path: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(format!("failed to build HTTP client: {e}")))?;
        let url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            health_path.trim_start_matches('/')
        );
        Ok(HttpProbe { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ConnectivityProbe for HttpProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            match self.client.get(&self.url).send().await {
                Ok(response) => !response.status().is_server_error(),
                Err(e) => {
                    tracing::debug!(url = %self.url, error = %e, "probe failed");
                    false
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
