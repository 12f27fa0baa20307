// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{
    AppliedSnapshot, CoordinatorState, DiscardReason, Effect, FetchTicket, Outcome, StageView,
    TransitionResult,
};
use residuals_domain::{PeriodKey, PipelineSnapshot, StageId};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Applies a command to the coordinator state.
///
/// This is a pure function: it never performs I/O and never reads the
/// clock. Fetches, cancellation and timers are returned as effects for the
/// runtime to execute.
///
/// # Arguments
///
/// * `state` - The current state (immutable)
/// * `command` - The command to apply
///
/// # Returns
///
/// * `Ok(TransitionResult)` containing the new state, effects and outcome
/// * `Err(CoreError)` if the command is not valid in this state
///
/// # Errors
///
/// Returns an error if:
/// - `Refresh`, `MutationCompleted` or `ToggleStageView` arrive with no
///   period selected
/// - `ToggleStageView` targets a locked stage
pub fn apply(state: &CoordinatorState, command: Command) -> Result<TransitionResult, CoreError> {
    match command {
        Command::SelectPeriod { period } => Ok(select_period(state, period)),
        Command::PollTick => Ok(poll_tick(state)),
        Command::Refresh => refresh(state),
        Command::MutationCompleted { period } => mutation_completed(state, period),
        Command::FetchSucceeded {
            ticket,
            snapshot,
            fetched_at,
        } => Ok(fetch_succeeded(state, ticket, snapshot, fetched_at)),
        Command::FetchFailed { ticket, reason } => Ok(fetch_failed(state, ticket, reason)),
        Command::ToggleStageView { stage } => toggle_stage_view(state, stage),
        Command::Shutdown => Ok(shutdown(state)),
    }
}

const fn unchanged(state: CoordinatorState) -> TransitionResult {
    TransitionResult {
        new_state: state,
        effects: Vec::new(),
        outcome: Outcome::Unchanged,
    }
}

fn select_period(state: &CoordinatorState, period: PeriodKey) -> TransitionResult {
    let mut new_state: CoordinatorState = state.clone();
    let mut effects: Vec<Effect> = Vec::new();

    if state.active_period.is_some() {
        effects.push(Effect::CancelGeneration {
            generation: state.generation,
        });
    }

    new_state.active_period = Some(period);
    new_state.generation += 1;
    new_state.in_flight = None;
    new_state.follow_up_requested = false;
    new_state.current = None;
    new_state.consecutive_failures = 0;
    new_state.last_error = None;
    new_state.stage_view = StageView::FollowCurrent;
    new_state.polling = true;

    let ticket: FetchTicket = new_state.issue_ticket(period);
    effects.push(Effect::Fetch(ticket));
    effects.push(Effect::StartPolling {
        period,
        generation: new_state.generation,
    });

    info!(
        period = %period,
        generation = new_state.generation,
        "Selected period"
    );

    TransitionResult {
        new_state,
        effects,
        outcome: Outcome::Awaiting {
            sequence: ticket.sequence,
        },
    }
}

fn poll_tick(state: &CoordinatorState) -> TransitionResult {
    let Some(period) = state.active_period else {
        return unchanged(state.clone());
    };

    if !state.polling || state.in_flight.is_some() {
        debug!(period = %period, "Poll tick skipped");
        return unchanged(state.clone());
    }

    let mut new_state: CoordinatorState = state.clone();
    let ticket: FetchTicket = new_state.issue_ticket(period);

    TransitionResult {
        new_state,
        effects: vec![Effect::Fetch(ticket)],
        outcome: Outcome::Awaiting {
            sequence: ticket.sequence,
        },
    }
}

/// Issues a fetch, or joins the one already outstanding.
fn refresh(state: &CoordinatorState) -> Result<TransitionResult, CoreError> {
    let period: PeriodKey = state.active_period.ok_or(CoreError::NoActivePeriod)?;

    if let Some(in_flight) = state.in_flight {
        debug!(
            period = %period,
            sequence = in_flight.sequence,
            "Refresh coalesced with in-flight fetch"
        );
        return Ok(TransitionResult {
            new_state: state.clone(),
            effects: Vec::new(),
            outcome: Outcome::Awaiting {
                sequence: in_flight.sequence,
            },
        });
    }

    let mut new_state: CoordinatorState = state.clone();
    let ticket: FetchTicket = new_state.issue_ticket(period);

    Ok(TransitionResult {
        new_state,
        effects: vec![Effect::Fetch(ticket)],
        outcome: Outcome::Awaiting {
            sequence: ticket.sequence,
        },
    })
}

/// A mutation changes upstream data, so an outstanding fetch may already be
/// out of date. Rather than joining it, a follow-up fetch is queued.
fn mutation_completed(
    state: &CoordinatorState,
    period: PeriodKey,
) -> Result<TransitionResult, CoreError> {
    let active: PeriodKey = state.active_period.ok_or(CoreError::NoActivePeriod)?;

    if active != period {
        debug!(
            period = %period,
            active = %active,
            "Mutation completed for inactive period"
        );
        return Ok(unchanged(state.clone()));
    }

    let mut new_state: CoordinatorState = state.clone();
    let mut effects: Vec<Effect> = Vec::new();

    if !state.polling {
        info!(period = %period, "Resuming polling after mutation");
        new_state.polling = true;
        effects.push(Effect::StartPolling {
            period,
            generation: state.generation,
        });
    }

    let sequence: u64 = if state.in_flight.is_some() {
        new_state.follow_up_requested = true;
        new_state.next_sequence
    } else {
        let ticket: FetchTicket = new_state.issue_ticket(period);
        effects.push(Effect::Fetch(ticket));
        ticket.sequence
    };

    Ok(TransitionResult {
        new_state,
        effects,
        outcome: Outcome::Awaiting { sequence },
    })
}

fn discard_reason(state: &CoordinatorState, ticket: &FetchTicket) -> Option<DiscardReason> {
    if state.active_period != Some(ticket.period) || state.generation != ticket.generation {
        Some(DiscardReason::StalePeriod)
    } else if state.accepts(ticket) {
        None
    } else {
        Some(DiscardReason::Superseded)
    }
}

fn discarded(
    state: &CoordinatorState,
    ticket: &FetchTicket,
    reason: DiscardReason,
) -> TransitionResult {
    debug!(
        period = %ticket.period,
        generation = ticket.generation,
        sequence = ticket.sequence,
        ?reason,
        "Discarded fetch result"
    );
    TransitionResult {
        new_state: state.clone(),
        effects: Vec::new(),
        outcome: Outcome::Discarded { reason },
    }
}

/// Clears the in-flight slot and issues a queued follow-up fetch, if any.
fn settle_in_flight(
    state: &mut CoordinatorState,
    ticket: &FetchTicket,
    effects: &mut Vec<Effect>,
) {
    if state.in_flight == Some(*ticket) {
        state.in_flight = None;
    }

    if state.follow_up_requested && state.in_flight.is_none() {
        state.follow_up_requested = false;
        let follow_up: FetchTicket = state.issue_ticket(ticket.period);
        effects.push(Effect::Fetch(follow_up));
    }
}

fn fetch_succeeded(
    state: &CoordinatorState,
    ticket: FetchTicket,
    snapshot: PipelineSnapshot,
    fetched_at: OffsetDateTime,
) -> TransitionResult {
    if let Some(reason) = discard_reason(state, &ticket) {
        return discarded(state, &ticket, reason);
    }

    let mut new_state: CoordinatorState = state.clone();
    let mut effects: Vec<Effect> = Vec::new();

    let applied: AppliedSnapshot = AppliedSnapshot::derive(ticket.sequence, fetched_at, snapshot);
    let terminal: bool = applied.progress.is_terminal;

    // A pinned panel whose stage became locked falls back to the current stage.
    if let StageView::Pinned(Some(stage)) = state.stage_view {
        if applied.stages.get(stage).is_locked() {
            new_state.stage_view = StageView::FollowCurrent;
        }
    }

    if state.consecutive_failures > 0 {
        info!(
            period = %ticket.period,
            failures = state.consecutive_failures,
            "Fetch recovered"
        );
    }

    debug!(
        period = %ticket.period,
        sequence = ticket.sequence,
        percent = applied.progress.percent,
        "Applied snapshot"
    );

    new_state.current = Some(applied);
    new_state.consecutive_failures = 0;
    new_state.last_error = None;

    if terminal && state.polling {
        info!(period = %ticket.period, "Pipeline complete, stopping polling");
        new_state.polling = false;
        effects.push(Effect::StopPolling);
    } else if !terminal && !state.polling {
        info!(period = %ticket.period, "Pipeline no longer complete, resuming polling");
        new_state.polling = true;
        effects.push(Effect::StartPolling {
            period: ticket.period,
            generation: ticket.generation,
        });
    }

    settle_in_flight(&mut new_state, &ticket, &mut effects);

    TransitionResult {
        new_state,
        effects,
        outcome: Outcome::Applied {
            sequence: ticket.sequence,
        },
    }
}

fn fetch_failed(state: &CoordinatorState, ticket: FetchTicket, reason: String) -> TransitionResult {
    if let Some(discard) = discard_reason(state, &ticket) {
        return discarded(state, &ticket, discard);
    }

    let mut new_state: CoordinatorState = state.clone();
    let mut effects: Vec<Effect> = Vec::new();

    new_state.consecutive_failures = state.consecutive_failures.saturating_add(1);
    let escalated: bool = new_state.is_escalated();

    if new_state.consecutive_failures == new_state.failure_threshold {
        warn!(
            period = %ticket.period,
            failures = new_state.consecutive_failures,
            error = %reason,
            "Pipeline status is stale"
        );
    } else {
        warn!(
            period = %ticket.period,
            failures = new_state.consecutive_failures,
            error = %reason,
            "Fetch failed, keeping previous snapshot"
        );
    }

    let consecutive_failures: u32 = new_state.consecutive_failures;
    new_state.last_error = Some(reason);
    settle_in_flight(&mut new_state, &ticket, &mut effects);

    TransitionResult {
        new_state,
        effects,
        outcome: Outcome::FailureRecorded {
            consecutive_failures,
            escalated,
        },
    }
}

fn toggle_stage_view(
    state: &CoordinatorState,
    stage: StageId,
) -> Result<TransitionResult, CoreError> {
    if state.active_period.is_none() {
        return Err(CoreError::NoActivePeriod);
    }

    if state.stage_state(stage).is_locked() {
        return Err(CoreError::StageLocked { stage });
    }

    let expanded: Option<StageId> = if state.expanded_stage() == Some(stage) {
        None
    } else {
        Some(stage)
    };

    let mut new_state: CoordinatorState = state.clone();
    new_state.stage_view = StageView::Pinned(expanded);

    Ok(TransitionResult {
        new_state,
        effects: Vec::new(),
        outcome: Outcome::StageViewChanged { expanded },
    })
}

fn shutdown(state: &CoordinatorState) -> TransitionResult {
    let mut new_state: CoordinatorState = state.clone();

    new_state.generation += 1;
    new_state.in_flight = None;
    new_state.follow_up_requested = false;
    new_state.polling = false;

    info!(generation = state.generation, "Coordinator shut down");

    TransitionResult {
        new_state,
        effects: vec![
            Effect::CancelGeneration {
                generation: state.generation,
            },
            Effect::StopPolling,
        ],
        outcome: Outcome::Stopped,
    }
}
