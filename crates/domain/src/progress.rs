// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Progress projection and headline metrics.

use crate::stages::{StageId, StageStates};
use crate::types::{AuditState, PipelineSnapshot};
use serde::{Deserialize, Serialize};

/// Percent contributed by each completed stage.
const PERCENT_PER_STAGE: u8 = 25;

/// Overall pipeline progress derived from stage states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineProgress {
    /// 0, 25, 50, 75 or 100.
    pub percent: u8,
    /// First stage that is not completed; `None` once terminal.
    pub current_stage: Option<StageId>,
    /// Whether the audit stage is completed.
    pub is_terminal: bool,
}

impl PipelineProgress {
    /// Whether the operator should see the "month complete" celebration.
    #[must_use]
    pub const fn should_celebrate(&self) -> bool {
        self.is_terminal
    }

    /// Operator-facing description of the step to work on next.
    #[must_use]
    pub const fn current_step_label(&self) -> &'static str {
        match self.current_stage {
            Some(stage) => stage.label(),
            None => "Complete",
        }
    }
}

/// Projects stage states onto a completion percentage.
///
/// Only the strict prefix of completed stages counts: a later stage's
/// completion contributes nothing unless every earlier stage is completed.
#[must_use]
pub fn project(states: &StageStates) -> PipelineProgress {
    let completed_prefix = states
        .iter()
        .take_while(|(_, state)| state.is_completed())
        .count();

    // At most four stages.
    let completed_prefix: u8 = u8::try_from(completed_prefix).unwrap_or(4);

    PipelineProgress {
        percent: completed_prefix * PERCENT_PER_STAGE,
        current_stage: states.current_stage(),
        is_terminal: states.audit.is_completed(),
    }
}

/// Headline numbers shown alongside the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineMetrics {
    /// Sources whose upload is validated.
    pub sources_validated: usize,
    /// Total number of sources.
    pub sources_total: usize,
    /// Records across all sources.
    pub total_records: u64,
    /// Revenue across all sources, in cents.
    pub total_revenue_cents: i64,
    /// Leads in the lead sheet.
    pub lead_sheet_records: u64,
    /// Unassigned records; `None` while the assignment summary is loading.
    pub unassigned: Option<u64>,
    /// Previously assigned records; `None` while loading.
    pub previously_assigned: Option<u64>,
    /// Sources whose audit passed.
    pub audits_passed: usize,
    /// Sources whose audit failed.
    pub audits_failed: usize,
    /// Sources whose audit is pending.
    pub audits_pending: usize,
}

impl PipelineMetrics {
    /// Computes metrics from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &PipelineSnapshot) -> Self {
        let count_audits =
            |state: AuditState| snapshot.audits.iter().filter(|a| a.audit_state == state).count();

        Self {
            sources_validated: snapshot.validated_source_count(),
            sources_total: snapshot.sources.len(),
            total_records: snapshot.total_records(),
            total_revenue_cents: snapshot.total_revenue_cents(),
            lead_sheet_records: snapshot.lead_sheet.record_count,
            unassigned: snapshot.assignment.unassigned(),
            previously_assigned: snapshot.assignment.previously_assigned(),
            audits_passed: count_audits(AuditState::Passed),
            audits_failed: count_audits(AuditState::Failed),
            audits_pending: count_audits(AuditState::Pending),
        }
    }
}
