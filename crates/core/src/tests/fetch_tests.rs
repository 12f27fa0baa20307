// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    assigned_snapshot, empty_snapshot, fetch_ticket, fetched_at, has_fetch, loaded, march,
    selected, step, uploaded_snapshot,
};
use crate::{
    Command, CoordinatorState, CoreError, DiscardReason, FetchTicket, Outcome, TransitionResult,
    apply,
};
use residuals_domain::{StageId, StageState};
use std::sync::Arc;

#[test]
fn test_fetch_success_applies_snapshot_and_derives_stages() {
    let state: CoordinatorState = loaded(uploaded_snapshot(march()));

    let applied = state.current.as_ref().unwrap();
    assert_eq!(applied.stages.upload, StageState::Completed);
    assert_eq!(applied.stages.compile, StageState::Completed);
    assert_eq!(applied.stages.assign, StageState::InProgress);
    assert_eq!(applied.stages.audit, StageState::Locked);
    assert_eq!(applied.progress.percent, 50);
    assert_eq!(applied.progress.current_stage, Some(StageId::Assign));
    assert_eq!(applied.metrics.total_records, 3_000);
    assert_eq!(
        applied.blockers,
        vec![String::from("Assignment summary is still loading")]
    );
    assert!(state.in_flight.is_none());
}

#[test]
fn test_fetch_failure_keeps_previous_snapshot() {
    let state: CoordinatorState = loaded(uploaded_snapshot(march()));
    let before = state.current.clone();

    let refresh: TransitionResult = step(&state, Command::Refresh);
    let ticket: FetchTicket = fetch_ticket(&refresh);
    let result: TransitionResult = step(
        &refresh.new_state,
        Command::FetchFailed {
            ticket,
            reason: String::from("assignment service returned 500"),
        },
    );

    assert_eq!(
        result.outcome,
        Outcome::FailureRecorded {
            consecutive_failures: 1,
            escalated: false
        }
    );
    assert_eq!(result.new_state.current, before);
    assert!(result.new_state.is_stale());
    assert_eq!(
        result.new_state.last_error.as_deref(),
        Some("assignment service returned 500")
    );
}

#[test]
fn test_failures_escalate_at_threshold_and_reset_on_success() {
    let mut state: CoordinatorState = loaded(uploaded_snapshot(march()));

    for expected in 1..=3_u32 {
        let refresh: TransitionResult = step(&state, Command::Refresh);
        let ticket: FetchTicket = fetch_ticket(&refresh);
        let result: TransitionResult = step(
            &refresh.new_state,
            Command::FetchFailed {
                ticket,
                reason: String::from("connection refused"),
            },
        );
        assert_eq!(
            result.outcome,
            Outcome::FailureRecorded {
                consecutive_failures: expected,
                escalated: expected >= 3
            }
        );
        state = result.new_state;
    }
    assert!(state.is_escalated());

    let refresh: TransitionResult = step(&state, Command::Refresh);
    let ticket: FetchTicket = fetch_ticket(&refresh);
    let result: TransitionResult = step(
        &refresh.new_state,
        Command::FetchSucceeded {
            ticket,
            snapshot: assigned_snapshot(march()),
            fetched_at: fetched_at(),
        },
    );

    assert_eq!(result.new_state.consecutive_failures, 0);
    assert!(!result.new_state.is_stale());
    assert!(!result.new_state.is_escalated());
    assert!(result.new_state.last_error.is_none());
}

#[test]
fn test_custom_failure_threshold() {
    let state: CoordinatorState = CoordinatorState::new(1);
    let result: TransitionResult = step(&state, Command::SelectPeriod { period: march() });
    let ticket: FetchTicket = fetch_ticket(&result);

    let result: TransitionResult = step(
        &result.new_state,
        Command::FetchFailed {
            ticket,
            reason: String::from("timeout"),
        },
    );

    assert_eq!(
        result.outcome,
        Outcome::FailureRecorded {
            consecutive_failures: 1,
            escalated: true
        }
    );
}

#[test]
fn test_zero_threshold_is_treated_as_one() {
    assert_eq!(CoordinatorState::new(0).failure_threshold, 1);
}

#[test]
fn test_duplicate_result_is_superseded() {
    let (state, ticket) = selected(march());
    let first: TransitionResult = step(
        &state,
        Command::FetchSucceeded {
            ticket,
            snapshot: uploaded_snapshot(march()),
            fetched_at: fetched_at(),
        },
    );

    let second: TransitionResult = step(
        &first.new_state,
        Command::FetchSucceeded {
            ticket,
            snapshot: empty_snapshot(march()),
            fetched_at: fetched_at(),
        },
    );

    assert_eq!(
        second.outcome,
        Outcome::Discarded {
            reason: DiscardReason::Superseded
        }
    );
    assert_eq!(second.new_state, first.new_state);
}

#[test]
fn test_refresh_coalesces_with_in_flight_fetch() {
    let (state, ticket) = selected(march());

    let result: TransitionResult = step(&state, Command::Refresh);

    assert!(result.effects.is_empty());
    assert_eq!(
        result.outcome,
        Outcome::Awaiting {
            sequence: ticket.sequence
        }
    );
    assert_eq!(result.new_state, state);
}

#[test]
fn test_refresh_without_period_is_rejected() {
    let result: Result<TransitionResult, CoreError> =
        apply(&CoordinatorState::default(), Command::Refresh);

    assert_eq!(result, Err(CoreError::NoActivePeriod));
}

#[test]
fn test_mutation_while_fetching_queues_follow_up() {
    let (state, ticket) = selected(march());

    let mutation: TransitionResult = step(&state, Command::MutationCompleted { period: march() });

    assert!(!has_fetch(&mutation));
    assert!(mutation.new_state.follow_up_requested);
    let Outcome::Awaiting { sequence } = mutation.outcome else {
        panic!("expected awaiting outcome, got {:?}", mutation.outcome);
    };
    assert!(sequence > ticket.sequence);

    // The in-flight fetch completes with pre-mutation data; a follow-up is issued.
    let completed: TransitionResult = step(
        &mutation.new_state,
        Command::FetchSucceeded {
            ticket,
            snapshot: uploaded_snapshot(march()),
            fetched_at: fetched_at(),
        },
    );

    let follow_up: FetchTicket = fetch_ticket(&completed);
    assert_eq!(follow_up.sequence, sequence);
    assert!(!completed.new_state.follow_up_requested);
    assert_eq!(completed.new_state.in_flight, Some(follow_up));
}

#[test]
fn test_follow_up_issued_after_failure_too() {
    let (state, ticket) = selected(march());
    let mutation: TransitionResult = step(&state, Command::MutationCompleted { period: march() });

    let failed: TransitionResult = step(
        &mutation.new_state,
        Command::FetchFailed {
            ticket,
            reason: String::from("timeout"),
        },
    );

    assert!(has_fetch(&failed));
}

#[test]
fn test_mutation_when_idle_fetches_immediately() {
    let state: CoordinatorState = loaded(uploaded_snapshot(march()));

    let result: TransitionResult = step(&state, Command::MutationCompleted { period: march() });

    let ticket: FetchTicket = fetch_ticket(&result);
    assert_eq!(
        result.outcome,
        Outcome::Awaiting {
            sequence: ticket.sequence
        }
    );
}

#[test]
fn test_mutation_for_inactive_period_is_ignored() {
    let state: CoordinatorState = loaded(uploaded_snapshot(march()));

    let result: TransitionResult = step(
        &state,
        Command::MutationCompleted {
            period: crate::tests::helpers::february(),
        },
    );

    assert_eq!(result.outcome, Outcome::Unchanged);
    assert!(result.effects.is_empty());
}

#[test]
fn test_snapshot_is_shared_not_copied_into_views() {
    let state: CoordinatorState = loaded(uploaded_snapshot(march()));

    let first = state.view();
    let second = state.view();

    let a = &first.applied.as_ref().unwrap().snapshot;
    let b = &second.applied.as_ref().unwrap().snapshot;
    assert!(Arc::ptr_eq(a, b));
}
