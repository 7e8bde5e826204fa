// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! edq-core: Offline action queue for emergency department stations
//!
//! This crate provides the action data model, the persistent SQLite queue,
//! the sync report, and the downtime state machine shared by the edq CLI
//! and its sync services.

pub mod action;
pub mod downtime;
pub mod error;
pub mod report;
pub mod store;

pub use action::{ActionId, ActionRecord, ActionType, CaseRef, NewAction};
pub use downtime::{DowntimeEvent, DowntimeState, LastSyncError, OfflineCause};
pub use error::{Error, Result};
pub use report::{FailureKind, SyncFailure, SyncReport};
pub use store::QueueStore;
