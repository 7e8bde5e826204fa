// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Downtime mode state machine.
//!
//! ```text
//!            lost / call failed / queued
//!   Online ─────────────────────────────► Offline ◄──────────┐
//!     ▲                                     │  ▲             │
//!     │ restored, 0 pending                 │  │ failures or │
//!     └─────────────────────────────────────┘  │ new pending │
//!     ▲                         sync started   ▼             │
//!     └──────────── finished clean ───────── Syncing ────────┘
//! ```
//!
//! [`DowntimeState::apply`] is total: every event is defined in every state,
//! and events that make no sense in a state leave it unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the station is in downtime mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfflineCause {
    /// The network monitor reported lost connectivity.
    ConnectivityLost,
    /// A case service call failed with a network error.
    CallFailed,
    /// The server is reachable but queued actions still need a sync.
    PendingActions,
}

impl OfflineCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfflineCause::ConnectivityLost => "connectivity lost",
            OfflineCause::CallFailed => "case service unreachable",
            OfflineCause::PendingActions => "pending actions",
        }
    }
}

/// Result of the last sync run, when it was not clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LastSyncError {
    /// The run finished but some actions failed.
    Partial { failed: usize },
    /// The run stopped on a storage fault.
    Aborted { message: String },
}

impl fmt::Display for LastSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastSyncError::Partial { failed } => write!(f, "{failed} action(s) failed to sync"),
            LastSyncError::Aborted { message } => write!(f, "sync aborted: {message}"),
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DowntimeEvent {
    /// Network monitor: connectivity lost.
    ConnectivityLost,
    /// Network monitor or a successful probe: connectivity back.
    ConnectivityRestored,
    /// A case service call failed with a network error.
    CallFailed,
    /// An action was queued; `pending` is the new queue length.
    ActionQueued { pending: usize },
    /// A sync run began over `pending` actions.
    SyncStarted { pending: usize },
    /// A sync run completed; `pending` is what is still queued afterwards.
    SyncFinished { failed: usize, pending: usize },
    /// A sync run hit a storage fault.
    SyncAborted { pending: usize, message: String },
}

/// Whether the station talks to the server directly or queues locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DowntimeState {
    /// Connectivity assumed and nothing queued.
    Online,
    /// Downtime mode: new actions are queued.
    Offline {
        pending: usize,
        cause: OfflineCause,
        #[serde(skip_serializing_if = "Option::is_none")]
        sync_error: Option<LastSyncError>,
    },
    /// A sync run is draining the queue.
    Syncing { pending: usize },
}

impl DowntimeState {
    /// Initial state at startup, from the surviving queue and live connectivity.
    pub fn boot(pending: usize, online: bool) -> Self {
        match (online, pending) {
            (true, 0) => DowntimeState::Online,
            (true, pending) => DowntimeState::offline(pending, OfflineCause::PendingActions),
            (false, pending) => DowntimeState::offline(pending, OfflineCause::ConnectivityLost),
        }
    }

    fn offline(pending: usize, cause: OfflineCause) -> Self {
        DowntimeState::Offline {
            pending,
            cause,
            sync_error: None,
        }
    }

    /// Apply an event and return the next state.
    pub fn apply(self, event: DowntimeEvent) -> Self {
        use DowntimeEvent as E;
        use DowntimeState as S;

        match (self, event) {
            // Online
            (S::Online, E::ConnectivityLost) => S::offline(0, OfflineCause::ConnectivityLost),
            (S::Online, E::CallFailed) => S::offline(0, OfflineCause::CallFailed),
            (S::Online, E::ActionQueued { pending }) => {
                S::offline(pending, OfflineCause::PendingActions)
            }
            (S::Online, E::SyncStarted { pending }) if pending > 0 => S::Syncing { pending },
            (S::Online, _) => S::Online,

            // Offline
            (
                S::Offline {
                    pending,
                    sync_error,
                    ..
                },
                E::ConnectivityLost,
            ) => S::Offline {
                pending,
                cause: OfflineCause::ConnectivityLost,
                sync_error,
            },
            (
                S::Offline {
                    pending,
                    sync_error,
                    ..
                },
                E::CallFailed,
            ) => S::Offline {
                pending,
                cause: OfflineCause::CallFailed,
                sync_error,
            },
            (S::Offline { pending: 0, .. }, E::ConnectivityRestored) => S::Online,
            (
                S::Offline {
                    pending,
                    sync_error,
                    ..
                },
                E::ConnectivityRestored,
            ) => S::Offline {
                pending,
                cause: OfflineCause::PendingActions,
                sync_error,
            },
            (
                S::Offline {
                    cause, sync_error, ..
                },
                E::ActionQueued { pending },
            ) => S::Offline {
                pending,
                cause,
                sync_error,
            },
            (state @ S::Offline { .. }, E::SyncStarted { pending: 0 }) => state,
            (S::Offline { .. }, E::SyncStarted { pending }) => S::Syncing { pending },
            (state @ S::Offline { .. }, E::SyncFinished { .. } | E::SyncAborted { .. }) => state,

            // Syncing: the run completes over its snapshot whatever happens meanwhile
            (S::Syncing { .. }, E::ActionQueued { pending }) => S::Syncing { pending },
            (S::Syncing { .. }, E::SyncFinished { failed: 0, pending: 0 }) => S::Online,
            (S::Syncing { .. }, E::SyncFinished { failed: 0, pending }) => {
                S::offline(pending, OfflineCause::PendingActions)
            }
            (S::Syncing { .. }, E::SyncFinished { failed, pending }) => S::Offline {
                pending,
                cause: OfflineCause::PendingActions,
                sync_error: Some(LastSyncError::Partial { failed }),
            },
            (S::Syncing { .. }, E::SyncAborted { pending, message }) => S::Offline {
                pending,
                cause: OfflineCause::PendingActions,
                sync_error: Some(LastSyncError::Aborted { message }),
            },
            (
                state @ S::Syncing { .. },
                E::ConnectivityLost
                | E::ConnectivityRestored
                | E::CallFailed
                | E::SyncStarted { .. },
            ) => state,
        }
    }

    /// True while actions are being queued instead of sent.
    pub fn is_downtime(&self) -> bool {
        !matches!(self, DowntimeState::Online)
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self, DowntimeState::Syncing { .. })
    }

    /// Queued actions known to the state machine.
    pub fn pending(&self) -> usize {
        match self {
            DowntimeState::Online => 0,
            DowntimeState::Offline { pending, .. } | DowntimeState::Syncing { pending } => *pending,
        }
    }

    /// Error from the last sync run, if it was not clean.
    pub fn sync_error(&self) -> Option<&LastSyncError> {
        match self {
            DowntimeState::Offline { sync_error, .. } => sync_error.as_ref(),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DowntimeState::Online => "online",
            DowntimeState::Offline { .. } => "offline",
            DowntimeState::Syncing { .. } => "syncing",
        }
    }
}

impl fmt::Display for DowntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DowntimeState::Online => write!(f, "online"),
            DowntimeState::Offline {
                pending,
                cause,
                sync_error,
            } => {
                write!(f, "offline ({}), {pending} pending", cause.as_str())?;
                if let Some(err) = sync_error {
                    write!(f, "; {err}")?;
                }
                Ok(())
            }
            DowntimeState::Syncing { pending } => write!(f, "syncing {pending} action(s)"),
        }
    }
}

#[cfg(test)]
#[path = "downtime_tests.rs"]
mod tests;
