// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Downtime controller.
//!
//! Owns the station's [`DowntimeState`] and routes case-changing intents:
//! straight to the case service while online, into the offline queue
//! otherwise. Connectivity events from the [`NetworkMonitor`] and the
//! outcome of every call drive the state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use edq_core::{
    ActionId, ActionType, DowntimeEvent, DowntimeState, FailureKind, NewAction, QueueStore,
    SyncReport,
};
use serde::Serialize;

use super::coordinator::SyncCoordinator;
use super::monitor::{ListenerGuard, NetworkMonitor};
use super::service::{Case, CaseService, ServiceError, ServiceResult};
use crate::error::Result;

/// Result of a sync trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The run went through its whole snapshot.
    Completed(SyncReport),
    /// A run was already in progress; this trigger was coalesced into it.
    AlreadyRunning,
}

/// Where a submitted action went.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Submitted {
    /// The server applied it.
    Sent { case: Case },
    /// It was queued for the next sync.
    Queued { id: ActionId },
}

type SharedState = Arc<Mutex<DowntimeState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, DowntimeState> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn transition(state: &SharedState, event: DowntimeEvent) -> DowntimeState {
    let mut guard = lock(state);
    let next = guard.clone().apply(event.clone());
    if *guard != next {
        tracing::debug!(from = guard.name(), to = next.name(), ?event, "downtime transition");
    }
    *guard = next.clone();
    next
}

/// Clears the run-in-progress flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wires the queue store, case service, network monitor and state machine.
pub struct Downtime {
    store: Arc<QueueStore>,
    service: Arc<dyn CaseService>,
    monitor: NetworkMonitor,
    coordinator: SyncCoordinator,
    state: SharedState,
    syncing: AtomicBool,
    last_report: Mutex<Option<SyncReport>>,
    _listeners: ListenerGuard,
}

impl Downtime {
    /// Boot the controller. The initial state comes from the surviving queue
    /// and the monitor's current view of connectivity.
    pub fn new(
        store: Arc<QueueStore>,
        service: Arc<dyn CaseService>,
        monitor: NetworkMonitor,
    ) -> Result<Self> {
        let pending = store.count()?;
        let state: SharedState = Arc::new(Mutex::new(DowntimeState::boot(
            pending,
            monitor.is_online(),
        )));

        let on_restored = Arc::clone(&state);
        let on_lost = Arc::clone(&state);
        let listeners = monitor.add_listeners(
            move || {
                transition(&on_restored, DowntimeEvent::ConnectivityRestored);
            },
            move || {
                transition(&on_lost, DowntimeEvent::ConnectivityLost);
            },
        );

        Ok(Downtime {
            coordinator: SyncCoordinator::new(Arc::clone(&store)),
            store,
            service,
            monitor,
            state,
            syncing: AtomicBool::new(false),
            last_report: Mutex::new(None),
            _listeners: listeners,
        })
    }

    /// Current downtime state.
    pub fn state(&self) -> DowntimeState {
        lock(&self.state).clone()
    }

    /// Report of the last completed sync run in this session.
    pub fn last_report(&self) -> Option<SyncReport> {
        self.last_report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.store.count()?)
    }

    /// Register connectivity callbacks on the underlying monitor.
    pub fn add_network_listeners<R, L>(&self, on_restored: R, on_lost: L) -> ListenerGuard
    where
        R: Fn() + Send + Sync + 'static,
        L: Fn() + Send + Sync + 'static,
    {
        self.monitor.add_listeners(on_restored, on_lost)
    }

    /// Queue an action for the next sync run.
    pub fn queue_offline_action(&self, action: &NewAction) -> Result<ActionId> {
        let id = self.store.enqueue(action)?;
        self.after_enqueue(id, action)
    }

    fn after_enqueue(&self, id: ActionId, action: &NewAction) -> Result<ActionId> {
        let pending = self.store.count()?;
        transition(&self.state, DowntimeEvent::ActionQueued { pending });
        tracing::info!(id = id.0, action_type = %action.action_type, pending, "action queued offline");
        Ok(id)
    }

    /// Apply an action: directly while online with an empty queue, queued
    /// otherwise.
    ///
    /// A network failure on the direct call queues the action under the key
    /// already sent. A rejection is returned to the caller and nothing is
    /// queued.
    pub async fn submit(&self, action: NewAction) -> Result<Submitted> {
        action.validate()?;

        // Queued work must reach the server first to keep ordering
        if self.state().is_downtime() || !self.monitor.is_online() {
            let id = self.queue_offline_action(&action)?;
            return Ok(Submitted::Queued { id });
        }

        let case_id = match action.case_ref()? {
            Some(case_ref) => match self.store.resolve_case(&case_ref)? {
                Some(case_id) => Some(case_id),
                None => {
                    let id = self.queue_offline_action(&action)?;
                    return Ok(Submitted::Queued { id });
                }
            },
            None => None,
        };

        let key = uuid::Uuid::new_v4().to_string();
        match self.dispatch(&action, case_id, key.clone()).await {
            Ok(case) => {
                self.monitor.report_call_success();
                tracing::debug!(case = %case.id, action_type = %action.action_type, "applied directly");
                Ok(Submitted::Sent { case })
            }
            Err(e) if e.is_network() => {
                tracing::warn!(error = %e, "case service unreachable, entering downtime mode");
                self.monitor.report_call_outcome(&e);
                transition(&self.state, DowntimeEvent::CallFailed);
                let id = self.store.enqueue_with_key(&action, &key)?;
                let id = self.after_enqueue(id, &action)?;
                Ok(Submitted::Queued { id })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn dispatch(
        &self,
        action: &NewAction,
        case_id: Option<String>,
        key: String,
    ) -> ServiceResult<Case> {
        let case_id = case_id.unwrap_or_default();
        match action.action_type {
            ActionType::CreateCase => self.service.create_case(action.data.clone(), key).await,
            ActionType::UpdateTriage => {
                self.service
                    .update_triage(case_id, action.data.clone(), key)
                    .await
            }
            ActionType::UpdateStatus => {
                let status = action
                    .data
                    .get("status")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                self.service.update_status(case_id, status, key).await
            }
        }
    }

    /// Replay the queue against the case service.
    ///
    /// Only one run happens at a time: a trigger while a run is in progress
    /// returns [`SyncOutcome::AlreadyRunning`] without starting another.
    /// Storage faults abort the run and are returned as errors; action
    /// failures are reported in the [`SyncReport`].
    pub async fn sync_with_server(&self) -> Result<SyncOutcome> {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("sync already running");
            return Ok(SyncOutcome::AlreadyRunning);
        }
        let _running = RunGuard(&self.syncing);

        let pending = self.store.count()?;
        transition(&self.state, DowntimeEvent::SyncStarted { pending });

        let report = match self.coordinator.run(self.service.as_ref()).await {
            Ok(report) => report,
            Err(e) => {
                let pending = self.store.count().unwrap_or(pending);
                transition(
                    &self.state,
                    DowntimeEvent::SyncAborted {
                        pending,
                        message: e.to_string(),
                    },
                );
                return Err(e.into());
            }
        };

        let remaining = self.store.count()?;
        transition(
            &self.state,
            DowntimeEvent::SyncFinished {
                failed: report.failed,
                pending: remaining,
            },
        );

        // Feed call outcomes to the monitor once the run has settled
        if let Some(network) = report
            .errors
            .iter()
            .find(|f| f.kind == FailureKind::Network)
        {
            self.monitor
                .report_call_outcome(&ServiceError::Network(network.error.clone()));
            transition(&self.state, DowntimeEvent::CallFailed);
        } else if report.success > 0 {
            self.monitor.report_call_success();
        }

        *self
            .last_report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(report.clone());

        Ok(SyncOutcome::Completed(report))
    }

    /// Manual "retry connection": probe the live board. On success the
    /// monitor reports restored connectivity; on failure the station stays
    /// in downtime mode and the error is only logged.
    ///
    /// Returns true if the server answered.
    pub async fn retry_connection(&self) -> bool {
        match self.service.live_board().await {
            Ok(board) => {
                tracing::info!(cases = board.len(), "case service reachable");
                self.monitor.report_call_success();
                transition(&self.state, DowntimeEvent::ConnectivityRestored);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "retry connection failed");
                if e.is_network() {
                    self.monitor.report_call_outcome(&e);
                }
                false
            }
        }
    }

    /// Fetch the live board, feeding the outcome to the monitor.
    pub async fn live_board(&self) -> Result<Vec<Case>> {
        match self.service.live_board().await {
            Ok(board) => {
                self.monitor.report_call_success();
                Ok(board)
            }
            Err(e) => {
                self.monitor.report_call_outcome(&e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "downtime_tests.rs"]
mod tests;
