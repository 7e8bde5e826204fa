// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Case service call timings.
//!
//! Enable with `EDQ_TIMINGS=1`. Every call made through a [`TimedService`]
//! is written to stderr as `[timings] update_status C1 12ms ok`, and
//! `edq sync` closes with a one-line summary of the run.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::sync::{Case, CaseService, ServiceFuture, ServiceResult};

/// Check if timings are enabled via the `EDQ_TIMINGS` environment variable.
#[inline]
pub fn timings_enabled() -> bool {
    crate::env::edq_timings()
}

/// One finished case service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTiming {
    pub call: &'static str,
    /// Case the call addressed, if any.
    pub case_id: Option<String>,
    pub elapsed: Duration,
    pub ok: bool,
}

impl fmt::Display for CallTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.call)?;
        if let Some(case_id) = &self.case_id {
            write!(f, " {case_id}")?;
        }
        write!(
            f,
            " {}ms {}",
            self.elapsed.as_millis(),
            if self.ok { "ok" } else { "failed" }
        )
    }
}

/// Running totals for the calls made during one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallTally {
    pub count: usize,
    pub total: Duration,
    pub slowest: Option<CallTiming>,
}

/// Shared tally of case service calls. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    tally: Arc<Mutex<CallTally>>,
}

impl CallLog {
    pub fn new() -> Self {
        CallLog::default()
    }

    fn lock(&self) -> MutexGuard<'_, CallTally> {
        self.tally.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, timing: CallTiming) {
        if timings_enabled() {
            eprintln!("[timings] {timing}");
        }
        let mut tally = self.lock();
        tally.count += 1;
        tally.total += timing.elapsed;
        let slower = match &tally.slowest {
            Some(slowest) => timing.elapsed > slowest.elapsed,
            None => true,
        };
        if slower {
            tally.slowest = Some(timing);
        }
    }

    /// Totals so far.
    pub fn tally(&self) -> CallTally {
        self.lock().clone()
    }

    /// `sync: 3 call(s), 41ms total, slowest update_status C1 20ms ok`
    pub fn summary(&self, phase: &str) -> String {
        let tally = self.lock();
        let mut line = format!(
            "{phase}: {} call(s), {}ms total",
            tally.count,
            tally.total.as_millis()
        );
        if let Some(slowest) = &tally.slowest {
            line.push_str(&format!(", slowest {slowest}"));
        }
        line
    }

    /// Print [`CallLog::summary`] to stderr if timings are enabled.
    pub fn print_summary(&self, phase: &str) {
        if timings_enabled() {
            eprintln!("[timings] {}", self.summary(phase));
        }
    }
}

/// [`CaseService`] wrapper that times every call into a [`CallLog`].
pub struct TimedService<S> {
    inner: S,
    log: CallLog,
}

impl<S: CaseService> TimedService<S> {
    pub fn new(inner: S, log: CallLog) -> Self {
        TimedService { inner, log }
    }

    async fn timed<T>(
        &self,
        call: &'static str,
        case_id: Option<String>,
        fut: ServiceFuture<'_, T>,
    ) -> ServiceResult<T> {
        let start = Instant::now();
        let result = fut.await;
        self.log.record(CallTiming {
            call,
            case_id,
            elapsed: start.elapsed(),
            ok: result.is_ok(),
        });
        result
    }
}

impl<S: CaseService> CaseService for TimedService<S> {
    fn create_case(&self, data: Value, idempotency_key: String) -> ServiceFuture<'_, Case> {
        Box::pin(self.timed(
            "create_case",
            None,
            self.inner.create_case(data, idempotency_key),
        ))
    }

    fn update_triage(
        &self,
        case_id: String,
        data: Value,
        idempotency_key: String,
    ) -> ServiceFuture<'_, Case> {
        let target = Some(case_id.clone());
        Box::pin(self.timed(
            "update_triage",
            target,
            self.inner.update_triage(case_id, data, idempotency_key),
        ))
    }

    fn update_status(
        &self,
        case_id: String,
        status: String,
        idempotency_key: String,
    ) -> ServiceFuture<'_, Case> {
        let target = Some(case_id.clone());
        Box::pin(self.timed(
            "update_status",
            target,
            self.inner.update_status(case_id, status, idempotency_key),
        ))
    }

    fn live_board(&self) -> ServiceFuture<'_, Vec<Case>> {
        Box::pin(self.timed("live_board", None, self.inner.live_board()))
    }
}

#[cfg(test)]
#[path = "timings_tests.rs"]
mod tests;
