// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::PipelineViewResponse;
use crate::tests::helpers::{complete_snapshot, march, uploaded_snapshot};
use residuals::{Command, CoordinatorState, FetchTicket, PipelineView, apply};
use residuals_domain::{PipelineSnapshot, StageId, StageState};
use time::macros::datetime;

fn view_of(snapshot: PipelineSnapshot) -> PipelineView {
    let selected = apply(
        &CoordinatorState::default(),
        Command::SelectPeriod { period: march() },
    )
    .unwrap();
    let ticket: FetchTicket = selected.new_state.in_flight.unwrap();
    let applied = apply(
        &selected.new_state,
        Command::FetchSucceeded {
            ticket,
            snapshot,
            fetched_at: datetime!(2026-03-15 14:00 UTC),
        },
    )
    .unwrap();
    applied.new_state.view()
}

#[test]
fn test_view_response_lists_stages_in_order() {
    let response: PipelineViewResponse = (&view_of(uploaded_snapshot(march()))).into();

    let ids: Vec<StageId> = response.stages.iter().map(|s| s.id).collect();
    assert_eq!(ids, StageId::ALL.to_vec());
    assert_eq!(response.stages[2].state, StageState::InProgress);
    assert!(response.stages[2].expanded);
    assert_eq!(response.current_step.as_deref(), Some("Assign Roles"));
    assert!(!response.celebrate);
    assert_eq!(response.metrics.unwrap().total_records, 12_600);
    assert_eq!(response.metrics.unwrap().unassigned, None);
    assert!(response.fetched_at.unwrap().starts_with("2026-03-15T14:00:00"));
}

#[test]
fn test_terminal_view_response_celebrates() {
    let response: PipelineViewResponse = (&view_of(complete_snapshot(march()))).into();

    assert!(response.celebrate);
    assert_eq!(response.current_step.as_deref(), Some("Complete"));
    assert_eq!(response.progress.unwrap().percent, 100);
    assert!(response.blockers.is_empty());
    assert!(response.stages.iter().all(|s| !s.expanded));
}

#[test]
fn test_view_before_first_snapshot() {
    let state: CoordinatorState = apply(
        &CoordinatorState::default(),
        Command::SelectPeriod { period: march() },
    )
    .unwrap()
    .new_state;

    let response: PipelineViewResponse = (&state.view()).into();

    assert!(response.fetching);
    assert!(response.stages.is_empty());
    assert!(response.snapshot.is_none());
    assert_eq!(response.expanded_stage, Some(StageId::Upload));
}

#[test]
fn test_view_response_serializes_period_as_string() {
    let response: PipelineViewResponse = (&view_of(uploaded_snapshot(march()))).into();

    let json: serde_json::Value = serde_json::to_value(&response).unwrap();

    assert_eq!(json["period"], "2026-03");
    assert_eq!(json["stages"][0]["state"], "completed");
    assert_eq!(json["snapshot"]["assignment"]["loaded"], false);
}
