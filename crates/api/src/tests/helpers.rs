// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use crate::{CoordinatorConfig, PipelineCoordinator};
use residuals::PipelineView;
use residuals_domain::{
    AssignmentSummary, AuditResult, AuditState, LeadSheetStatus, PeriodKey, PipelineSnapshot,
    SourceStatus, UploadState,
};
use residuals_upstream::InMemoryBackend;
use std::sync::Arc;
use std::time::Duration;

pub const PROCESSORS: [(&str, &str); 7] = [
    ("tsys", "TSYS"),
    ("first-data", "First Data"),
    ("clearent", "Clearent"),
    ("paysafe", "Paysafe"),
    ("elavon", "Elavon"),
    ("worldpay", "Worldpay"),
    ("north", "North American Bancard"),
];

pub fn period(year: i32, month: u8) -> PeriodKey {
    PeriodKey::new(year, month).unwrap()
}

pub fn march() -> PeriodKey {
    period(2026, 3)
}

pub fn february() -> PeriodKey {
    period(2026, 2)
}

pub fn uploaded_snapshot(period: PeriodKey) -> PipelineSnapshot {
    let sources: Vec<SourceStatus> = PROCESSORS
        .iter()
        .map(|(id, name)| SourceStatus::new(id, name, UploadState::Validated, 1_800, 250_000))
        .collect();

    PipelineSnapshot::new(
        period,
        sources,
        LeadSheetStatus::new(UploadState::Validated, 980),
        AssignmentSummary::pending(),
        Vec::new(),
    )
}

pub fn assigned_snapshot(period: PeriodKey) -> PipelineSnapshot {
    let mut snapshot: PipelineSnapshot = uploaded_snapshot(period);
    snapshot.assignment = AssignmentSummary::loaded(0, 11_200);
    snapshot
}

pub fn complete_snapshot(period: PeriodKey) -> PipelineSnapshot {
    let mut snapshot: PipelineSnapshot = assigned_snapshot(period);
    snapshot.audits = PROCESSORS
        .iter()
        .map(|(id, name)| AuditResult::new(id, name, AuditState::Passed, Vec::new()))
        .collect();
    snapshot
}

/// Audit plan where Clearent and Worldpay fail.
pub fn two_failing_audits() -> Vec<AuditResult> {
    PROCESSORS
        .iter()
        .map(|(id, name)| match *id {
            "clearent" => AuditResult::new(
                id,
                name,
                AuditState::Failed,
                vec![String::from("Revenue mismatch of $120.00")],
            ),
            "worldpay" => AuditResult::new(
                id,
                name,
                AuditState::Failed,
                vec![String::from("14 merchants missing from lead sheet")],
            ),
            _ => AuditResult::new(id, name, AuditState::Passed, Vec::new()),
        })
        .collect()
}

pub fn create_test_coordinator(backend: &Arc<InMemoryBackend>) -> PipelineCoordinator {
    let backend: Arc<InMemoryBackend> = Arc::clone(backend);
    PipelineCoordinator::new(backend, CoordinatorConfig::default()).unwrap()
}

/// Waits until the published view satisfies `predicate`.
pub async fn wait_for_view(
    coordinator: &PipelineCoordinator,
    predicate: impl FnMut(&PipelineView) -> bool,
) -> PipelineView {
    let mut views = coordinator.subscribe();
    tokio::time::timeout(Duration::from_secs(120), views.wait_for(predicate))
        .await
        .expect("timed out waiting for view")
        .expect("view channel closed")
        .clone()
}

/// Waits until a snapshot for the active period has been applied.
pub async fn wait_for_snapshot(coordinator: &PipelineCoordinator) -> PipelineView {
    wait_for_view(coordinator, |view| view.applied.is_some()).await
}
