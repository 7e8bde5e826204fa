// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline sync for emergency department stations.
//!
//! Keeps case-changing actions flowing while the case service is down and
//! replays them once it is back.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Downtime   │────►│ CaseService │────►│    Case     │
//! │ (controller)│◄────│   (trait)   │◄────│   Server    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!    │      ▲                ▲
//!    │      │ events         │ replay
//!    │ ┌─────────────┐ ┌─────────────┐     ┌─────────────┐
//!    │ │  Network    │ │    Sync     │────►│ QueueStore  │
//!    │ │  Monitor    │ │ Coordinator │     │  (SQLite)   │
//!    │ └─────────────┘ └─────────────┘     └─────────────┘
//!    └─────────────────────────────────────────────▲
//!                    enqueue while offline
//! ```
//!
//! # Features
//!
//! - Direct calls while online, durable queueing while offline
//! - In-order replay with per-action failure reporting
//! - Idempotency keys on every mutating call
//! - Connectivity probe task with cancellable shutdown
//! - Injectable service and probe traits for testing

mod coordinator;
mod downtime;
mod monitor;
mod service;

pub use coordinator::SyncCoordinator;
pub use downtime::{Downtime, Submitted, SyncOutcome};
pub use monitor::{
    ConnectivityEvent, ConnectivityProbe, HttpProbe, ListenerGuard, NetworkMonitor, PollingHandle,
};
pub use service::{
    is_transient_status, Case, CaseService, HttpCaseService, ServiceError, ServiceFuture,
    ServiceResult, IDEMPOTENCY_HEADER,
};

#[cfg(test)]
pub(crate) mod test_helpers;
