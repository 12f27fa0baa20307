// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{march, uploaded_snapshot};
use crate::{InMemoryBackend, ResidualsBackend, UpstreamError};
use residuals_domain::{AuditResult, AuditRunResult, AuditState};

#[tokio::test]
async fn test_default_audit_run_passes_every_source() {
    let backend: InMemoryBackend = InMemoryBackend::new();
    backend.insert_snapshot(uploaded_snapshot(march()));

    let run: AuditRunResult = backend.run_audit(march()).await.unwrap();

    assert_eq!(run.results.len(), 2);
    assert!(run.is_clean());
    assert_eq!(backend.audit_results(march()).await.unwrap(), run.results);
    assert_eq!(backend.audit_runs(march()), 1);
}

#[tokio::test]
async fn test_planned_audit_results_are_stored() {
    let backend: InMemoryBackend = InMemoryBackend::new();
    backend.insert_snapshot(uploaded_snapshot(march()));
    backend.plan_audit(
        march(),
        vec![
            AuditResult::new("tsys", "TSYS", AuditState::Passed, Vec::new()),
            AuditResult::new(
                "elavon",
                "Elavon",
                AuditState::Failed,
                vec![String::from("Revenue mismatch of $42.10")],
            ),
        ],
    );

    let run: AuditRunResult = backend.run_audit(march()).await.unwrap();

    assert_eq!(run.failures().len(), 1);
    assert_eq!(backend.audit_results(march()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_audit_run_leaves_results_untouched() {
    let backend: InMemoryBackend = InMemoryBackend::new();
    backend.insert_snapshot(uploaded_snapshot(march()));
    backend.fail_audit_runs(Some("audit service unavailable"));

    let err: UpstreamError = backend.run_audit(march()).await.unwrap_err();

    assert_eq!(err.to_string(), "audit service unavailable");
    assert!(backend.audit_results(march()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_snapshot_edits_in_place() {
    let backend: InMemoryBackend = InMemoryBackend::new();
    backend.insert_snapshot(uploaded_snapshot(march()));

    backend.update_snapshot(march(), |s| s.lead_sheet.record_count = 1_200);

    let lead_sheet = backend.lead_sheet_status(march()).await.unwrap();
    assert_eq!(lead_sheet.record_count, 1_200);
}
