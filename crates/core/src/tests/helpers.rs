// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Command, CoordinatorState, Effect, FetchTicket, Outcome, TransitionResult, apply};
use residuals_domain::{
    AssignmentSummary, AuditResult, AuditState, LeadSheetStatus, PeriodKey, PipelineSnapshot,
    SourceStatus, UploadState,
};
use time::OffsetDateTime;
use time::macros::datetime;

pub const PROCESSORS: [(&str, &str); 3] = [
    ("tsys", "TSYS"),
    ("first-data", "First Data"),
    ("clearent", "Clearent"),
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

pub fn fetched_at() -> OffsetDateTime {
    datetime!(2026-03-15 14:00 UTC)
}

pub fn uploaded_snapshot(period: PeriodKey) -> PipelineSnapshot {
    let sources: Vec<SourceStatus> = PROCESSORS
        .iter()
        .map(|(id, name)| SourceStatus::new(id, name, UploadState::Validated, 1_000, 50_000))
        .collect();

    PipelineSnapshot::new(
        period,
        sources,
        LeadSheetStatus::new(UploadState::Validated, 400),
        AssignmentSummary::pending(),
        Vec::new(),
    )
}

pub fn assigned_snapshot(period: PeriodKey) -> PipelineSnapshot {
    let mut snapshot: PipelineSnapshot = uploaded_snapshot(period);
    snapshot.assignment = AssignmentSummary::loaded(0, 2_400);
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

pub fn empty_snapshot(period: PeriodKey) -> PipelineSnapshot {
    let sources: Vec<SourceStatus> = PROCESSORS
        .iter()
        .map(|(id, name)| SourceStatus::new(id, name, UploadState::NeedsUpload, 0, 0))
        .collect();

    PipelineSnapshot::new(
        period,
        sources,
        LeadSheetStatus::missing(),
        AssignmentSummary::pending(),
        Vec::new(),
    )
}

pub fn step(state: &CoordinatorState, command: Command) -> TransitionResult {
    apply(state, command).unwrap()
}

/// Returns the ticket of the single `Fetch` effect in a transition.
pub fn fetch_ticket(result: &TransitionResult) -> FetchTicket {
    let tickets: Vec<FetchTicket> = result
        .effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Fetch(ticket) => Some(*ticket),
            _ => None,
        })
        .collect();
    assert_eq!(tickets.len(), 1, "expected one fetch in {:?}", result.effects);
    tickets[0]
}

pub fn has_fetch(result: &TransitionResult) -> bool {
    result
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::Fetch(_)))
}

/// Selects a period and returns the state plus the issued ticket.
pub fn selected(period: PeriodKey) -> (CoordinatorState, FetchTicket) {
    let result: TransitionResult = step(
        &CoordinatorState::default(),
        Command::SelectPeriod { period },
    );
    let ticket: FetchTicket = fetch_ticket(&result);
    (result.new_state, ticket)
}

/// Selects a period and applies a first snapshot for it.
pub fn loaded(snapshot: PipelineSnapshot) -> CoordinatorState {
    let (state, ticket) = selected(snapshot.period);
    let result: TransitionResult = step(
        &state,
        Command::FetchSucceeded {
            ticket,
            snapshot,
            fetched_at: fetched_at(),
        },
    );
    assert_eq!(
        result.outcome,
        Outcome::Applied {
            sequence: ticket.sequence
        }
    );
    result.new_state
}
