// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    AssignmentSummary, AuditResult, AuditState, LeadSheetStatus, PeriodKey, PipelineSnapshot,
    SourceStatus, UploadState,
};

/// The seven processors used throughout the scenario tests.
pub const PROCESSORS: [(&str, &str); 7] = [
    ("tsys", "TSYS"),
    ("first-data", "First Data"),
    ("clearent", "Clearent"),
    ("paysafe", "Paysafe"),
    ("elavon", "Elavon"),
    ("worldpay", "Worldpay"),
    ("north", "North"),
];

pub fn create_test_period() -> PeriodKey {
    PeriodKey::new(2026, 3).unwrap()
}

/// Seven validated sources totalling 12,450 records.
pub fn create_validated_sources() -> Vec<SourceStatus> {
    PROCESSORS
        .iter()
        .enumerate()
        .map(|(i, (id, name))| {
            // 6 x 1,800 + 1,650 = 12,450
            let records: u64 = if i == 6 { 1_650 } else { 1_800 };
            SourceStatus::new(id, name, UploadState::Validated, records, 250_000)
        })
        .collect()
}

pub fn create_passed_audits() -> Vec<AuditResult> {
    PROCESSORS
        .iter()
        .map(|(id, name)| AuditResult::new(id, name, AuditState::Passed, Vec::new()))
        .collect()
}

/// Scenario 1: uploads complete, assignment not yet loaded, no audit run.
pub fn create_uploaded_snapshot() -> PipelineSnapshot {
    PipelineSnapshot::new(
        create_test_period(),
        create_validated_sources(),
        LeadSheetStatus::new(UploadState::Validated, 980),
        AssignmentSummary::pending(),
        Vec::new(),
    )
}

pub fn create_complete_snapshot() -> PipelineSnapshot {
    let mut snapshot = create_uploaded_snapshot();
    snapshot.assignment = AssignmentSummary::loaded(0, 11_200);
    snapshot.audits = create_passed_audits();
    snapshot
}
