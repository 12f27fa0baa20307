// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! In-process backend for local runs and tests.

use crate::backend::{ResidualsBackend, Subsystem};
use crate::error::UpstreamError;
use async_trait::async_trait;
use residuals_domain::{
    AssignmentSummary, AuditResult, AuditRunResult, AuditState, LeadSheetStatus, PeriodKey,
    PipelineSnapshot, SourceStatus,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    snapshots: HashMap<PeriodKey, PipelineSnapshot>,
    latency: HashMap<PeriodKey, Duration>,
    failing: HashMap<Subsystem, String>,
    audit_plans: HashMap<PeriodKey, Vec<AuditResult>>,
    audit_run_failure: Option<String>,
    source_reads: HashMap<PeriodKey, usize>,
    audit_runs: HashMap<PeriodKey, usize>,
}

/// A `ResidualsBackend` that serves snapshots held in memory.
///
/// Periods that were never inserted read as an empty month: no sources,
/// a missing lead sheet, an unloaded assignment summary and no audits.
/// Latency and failures can be injected per period and per subsystem.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a snapshot, replacing whatever the period held.
    pub fn insert_snapshot(&self, snapshot: PipelineSnapshot) {
        self.lock().snapshots.insert(snapshot.period, snapshot);
    }

    /// Applies `update` to the stored snapshot of a period.
    pub fn update_snapshot(&self, period: PeriodKey, update: impl FnOnce(&mut PipelineSnapshot)) {
        let mut state = self.lock();
        let snapshot: &mut PipelineSnapshot = state
            .snapshots
            .entry(period)
            .or_insert_with(|| empty_snapshot(period));
        update(snapshot);
    }

    /// Delays every read of a period.
    pub fn set_latency(&self, period: PeriodKey, latency: Duration) {
        self.lock().latency.insert(period, latency);
    }

    /// Makes every read of a subsystem fail with `reason`.
    pub fn fail_subsystem(&self, subsystem: Subsystem, reason: &str) {
        self.lock().failing.insert(subsystem, reason.to_string());
    }

    /// Clears an injected subsystem failure.
    pub fn recover_subsystem(&self, subsystem: Subsystem) {
        self.lock().failing.remove(&subsystem);
    }

    /// Sets the results the next audit runs of a period will produce.
    ///
    /// Without a plan, an audit run passes every source.
    pub fn plan_audit(&self, period: PeriodKey, results: Vec<AuditResult>) {
        self.lock().audit_plans.insert(period, results);
    }

    /// Makes audit runs fail outright, or succeed again with `None`.
    pub fn fail_audit_runs(&self, reason: Option<&str>) {
        self.lock().audit_run_failure = reason.map(str::to_string);
    }

    /// Number of source-status reads of a period, one per snapshot fetch.
    #[must_use]
    pub fn snapshot_reads(&self, period: PeriodKey) -> usize {
        self.lock().source_reads.get(&period).copied().unwrap_or(0)
    }

    /// Number of audit runs requested for a period.
    #[must_use]
    pub fn audit_runs(&self, period: PeriodKey) -> usize {
        self.lock().audit_runs.get(&period).copied().unwrap_or(0)
    }

    async fn read<T>(
        &self,
        period: PeriodKey,
        subsystem: Subsystem,
        select: impl FnOnce(&PipelineSnapshot) -> T + Send,
    ) -> Result<T, UpstreamError> {
        let latency: Option<Duration> = {
            let mut state = self.lock();
            if subsystem == Subsystem::Uploads {
                *state.source_reads.entry(period).or_insert(0) += 1;
            }
            state.latency.get(&period).copied()
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.lock();
        if let Some(reason) = state.failing.get(&subsystem) {
            debug!(period = %period, %subsystem, "Injected read failure");
            return Err(UpstreamError::Unavailable(reason.clone()));
        }

        match state.snapshots.get(&period) {
            Some(snapshot) => Ok(select(snapshot)),
            None => Ok(select(&empty_snapshot(period))),
        }
    }
}

fn empty_snapshot(period: PeriodKey) -> PipelineSnapshot {
    PipelineSnapshot::new(
        period,
        Vec::new(),
        LeadSheetStatus::missing(),
        AssignmentSummary::pending(),
        Vec::new(),
    )
}

#[async_trait]
impl ResidualsBackend for InMemoryBackend {
    async fn source_statuses(&self, period: PeriodKey) -> Result<Vec<SourceStatus>, UpstreamError> {
        self.read(period, Subsystem::Uploads, |s| s.sources.clone())
            .await
    }

    async fn lead_sheet_status(&self, period: PeriodKey) -> Result<LeadSheetStatus, UpstreamError> {
        self.read(period, Subsystem::LeadSheet, |s| s.lead_sheet.clone())
            .await
    }

    async fn assignment_summary(
        &self,
        period: PeriodKey,
    ) -> Result<AssignmentSummary, UpstreamError> {
        self.read(period, Subsystem::Assignments, |s| s.assignment)
            .await
    }

    async fn audit_results(&self, period: PeriodKey) -> Result<Vec<AuditResult>, UpstreamError> {
        self.read(period, Subsystem::Audits, |s| s.audits.clone())
            .await
    }

    async fn run_audit(&self, period: PeriodKey) -> Result<AuditRunResult, UpstreamError> {
        let mut state = self.lock();
        *state.audit_runs.entry(period).or_insert(0) += 1;

        if let Some(reason) = &state.audit_run_failure {
            return Err(UpstreamError::Unavailable(reason.clone()));
        }

        let planned: Option<Vec<AuditResult>> = state.audit_plans.get(&period).cloned();
        let snapshot: &mut PipelineSnapshot = state
            .snapshots
            .entry(period)
            .or_insert_with(|| empty_snapshot(period));

        let results: Vec<AuditResult> = planned.unwrap_or_else(|| {
            snapshot
                .sources
                .iter()
                .map(|source| {
                    AuditResult::new(
                        &source.source_id,
                        &source.source_name,
                        AuditState::Passed,
                        Vec::new(),
                    )
                })
                .collect()
        });

        snapshot.audits.clone_from(&results);

        Ok(AuditRunResult { period, results })
    }
}
