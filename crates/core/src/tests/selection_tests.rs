// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    complete_snapshot, february, fetch_ticket, fetched_at, loaded, march, selected, step,
    uploaded_snapshot,
};
use crate::{
    Command, CoordinatorState, DiscardReason, Effect, FetchTicket, Outcome, StageView,
    TransitionResult,
};
use residuals_domain::StageId;

#[test]
fn test_select_period_issues_fetch_and_starts_polling() {
    let result: TransitionResult = step(
        &CoordinatorState::default(),
        Command::SelectPeriod { period: march() },
    );

    let ticket: FetchTicket = fetch_ticket(&result);
    assert_eq!(ticket.period, march());
    assert_eq!(ticket.generation, 1);
    assert_eq!(ticket.sequence, 1);
    assert_eq!(
        result.effects,
        vec![
            Effect::Fetch(ticket),
            Effect::StartPolling {
                period: march(),
                generation: 1
            },
        ]
    );
    assert_eq!(result.outcome, Outcome::Awaiting { sequence: 1 });
    assert_eq!(result.new_state.active_period, Some(march()));
    assert_eq!(result.new_state.in_flight, Some(ticket));
    assert!(result.new_state.polling);
}

#[test]
fn test_first_selection_cancels_nothing() {
    let result: TransitionResult = step(
        &CoordinatorState::default(),
        Command::SelectPeriod { period: march() },
    );

    assert!(
        !result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::CancelGeneration { .. }))
    );
}

#[test]
fn test_switching_period_cancels_previous_generation() {
    let (state, _) = selected(march());

    let result: TransitionResult = step(&state, Command::SelectPeriod { period: february() });

    assert_eq!(
        result.effects[0],
        Effect::CancelGeneration { generation: 1 }
    );
    assert_eq!(result.new_state.generation, 2);
    assert_eq!(fetch_ticket(&result).period, february());
}

#[test]
fn test_switching_period_clears_previous_snapshot() {
    let state: CoordinatorState = loaded(uploaded_snapshot(march()));
    assert!(state.current.is_some());

    let result: TransitionResult = step(&state, Command::SelectPeriod { period: february() });

    assert!(result.new_state.current.is_none());
    assert_eq!(result.new_state.stage_view, StageView::FollowCurrent);
    assert_eq!(result.new_state.consecutive_failures, 0);
}

#[test]
fn test_result_for_previous_period_is_discarded() {
    // Select March, then February before March's fetch returns.
    let (state, march_ticket) = selected(march());
    let switched: TransitionResult =
        step(&state, Command::SelectPeriod { period: february() });
    let state: CoordinatorState = switched.new_state;

    let result: TransitionResult = step(
        &state,
        Command::FetchSucceeded {
            ticket: march_ticket,
            snapshot: complete_snapshot(march()),
            fetched_at: fetched_at(),
        },
    );

    assert_eq!(
        result.outcome,
        Outcome::Discarded {
            reason: DiscardReason::StalePeriod
        }
    );
    assert_eq!(result.new_state, state);
    assert!(result.new_state.current.is_none());
}

#[test]
fn test_result_for_reselected_period_from_old_generation_is_discarded() {
    // March, February, March again: a fetch from the first March selection
    // must not be applied to the second.
    let (state, first_ticket) = selected(march());
    let state: CoordinatorState =
        step(&state, Command::SelectPeriod { period: february() }).new_state;
    let state: CoordinatorState = step(&state, Command::SelectPeriod { period: march() }).new_state;

    let result: TransitionResult = step(
        &state,
        Command::FetchFailed {
            ticket: first_ticket,
            reason: String::from("timeout"),
        },
    );

    assert_eq!(
        result.outcome,
        Outcome::Discarded {
            reason: DiscardReason::StalePeriod
        }
    );
    assert_eq!(result.new_state.consecutive_failures, 0);
}

#[test]
fn test_reselecting_completed_period_resumes_polling() {
    let state: CoordinatorState = loaded(complete_snapshot(march()));
    assert!(!state.polling);

    let result: TransitionResult = step(&state, Command::SelectPeriod { period: march() });

    assert!(result.new_state.polling);
    assert!(result.effects.contains(&Effect::StartPolling {
        period: march(),
        generation: 2
    }));
}

#[test]
fn test_selection_resets_pinned_stage() {
    let state: CoordinatorState = loaded(uploaded_snapshot(march()));
    let state: CoordinatorState = step(
        &state,
        Command::ToggleStageView {
            stage: StageId::Upload,
        },
    )
    .new_state;
    assert_eq!(state.stage_view, StageView::Pinned(Some(StageId::Upload)));

    let result: TransitionResult = step(&state, Command::SelectPeriod { period: february() });

    assert_eq!(result.new_state.stage_view, StageView::FollowCurrent);
}

#[test]
fn test_sequences_increase_across_generations() {
    let (state, first) = selected(march());
    let result: TransitionResult = step(&state, Command::SelectPeriod { period: february() });
    let second: FetchTicket = fetch_ticket(&result);

    assert!(second.sequence > first.sequence);
    assert!(second.generation > first.generation);
}
