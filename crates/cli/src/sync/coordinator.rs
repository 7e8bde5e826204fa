// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordinator: replays the offline queue against the case service.
//!
//! A run works on a snapshot of the pending records taken when it starts,
//! in ascending id order. Individual failures are tallied in the
//! [`SyncReport`] and never abort the run; only storage faults do.

use std::sync::Arc;

use edq_core::{ActionRecord, ActionType, CaseRef, FailureKind, QueueStore, SyncReport};
use tracing::Instrument;

use super::service::CaseService;

/// Outcome of replaying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Replay {
    Synced,
    Failed(FailureKind, String),
}

/// Drains the queue store against a [`CaseService`].
#[derive(Clone)]
pub struct SyncCoordinator {
    store: Arc<QueueStore>,
}

impl SyncCoordinator {
    pub fn new(store: Arc<QueueStore>) -> Self {
        SyncCoordinator { store }
    }

    /// Run one sync pass over the currently pending records.
    ///
    /// Synced records are purged only when every record in the snapshot
    /// succeeded.
    pub async fn run(&self, service: &dyn CaseService) -> edq_core::Result<SyncReport> {
        let pending = self.store.list_pending()?;
        let span = tracing::info_span!("sync_run", pending = pending.len());

        async move {
            let mut report = SyncReport::default();

            for record in &pending {
                match self.replay(record, service).await? {
                    Replay::Synced => {
                        tracing::debug!(id = record.id.0, action_type = %record.action_type, "replayed");
                        report.record_success();
                    }
                    Replay::Failed(kind, error) => {
                        tracing::warn!(
                            id = record.id.0,
                            action_type = %record.action_type,
                            kind = %kind,
                            error = %error,
                            "replay failed"
                        );
                        report.record_failure(record.id, record.action_type, kind, error);
                    }
                }
            }

            if report.is_complete() {
                report.purged = self.store.purge_synced()?;
            }

            tracing::info!(
                success = report.success,
                failed = report.failed,
                purged = report.purged,
                "sync run finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Replay a single record. Storage faults propagate; everything else is a
    /// per-record failure.
    async fn replay(
        &self,
        record: &ActionRecord,
        service: &dyn CaseService,
    ) -> edq_core::Result<Replay> {
        let key = record.idempotency_key.clone();

        let result = match record.action_type {
            ActionType::CreateCase => {
                return match service.create_case(record.data.clone(), key).await {
                    Ok(case) => {
                        self.store.mark_created(record.id, &case.id)?;
                        Ok(Replay::Synced)
                    }
                    Err(e) => Ok(Replay::Failed(e.failure_kind(), e.to_string())),
                };
            }
            ActionType::UpdateTriage => {
                let case_id = match self.target_case(record)? {
                    Ok(case_id) => case_id,
                    Err(failure) => return Ok(failure),
                };
                service
                    .update_triage(case_id, record.data.clone(), key)
                    .await
            }
            ActionType::UpdateStatus => {
                let Some(status) = record.status().map(str::to_string) else {
                    return Ok(Replay::Failed(
                        FailureKind::Rejected,
                        "payload has no status".to_string(),
                    ));
                };
                let case_id = match self.target_case(record)? {
                    Ok(case_id) => case_id,
                    Err(failure) => return Ok(failure),
                };
                service.update_status(case_id, status, key).await
            }
        };

        match result {
            Ok(_) => {
                self.store.mark_synced(record.id)?;
                Ok(Replay::Synced)
            }
            Err(e) => Ok(Replay::Failed(e.failure_kind(), e.to_string())),
        }
    }

    /// Resolve the server case id an update targets.
    fn target_case(&self, record: &ActionRecord) -> edq_core::Result<Result<String, Replay>> {
        let case_ref = match record.case_ref() {
            Ok(Some(case_ref)) => case_ref,
            Ok(None) => {
                return Ok(Err(Replay::Failed(
                    FailureKind::Rejected,
                    format!("{} has no case id", record.action_type),
                )))
            }
            Err(e) => return Ok(Err(Replay::Failed(FailureKind::Rejected, e.to_string()))),
        };

        match self.store.resolve_case(&case_ref)? {
            Some(case_id) => Ok(Ok(case_id)),
            None => {
                let waiting_on = match case_ref {
                    CaseRef::Local(id) => id.to_string(),
                    CaseRef::Server(id) => id,
                };
                Ok(Err(Replay::Failed(
                    FailureKind::Dependency,
                    format!("case not created yet (waiting on {waiting_on})"),
                )))
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
