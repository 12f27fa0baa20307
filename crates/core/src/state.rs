// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use residuals_domain::{
    PeriodKey, PipelineMetrics, PipelineProgress, PipelineSnapshot, StageId, StageState,
    StageStates, evaluate, project, stage_blockers,
};
use std::sync::Arc;
use time::OffsetDateTime;

/// Default number of consecutive fetch failures before the staleness
/// indicator escalates.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Identifies one issued snapshot fetch.
///
/// A result is only applied if its ticket still matches the active period
/// and generation. Sequence numbers increase monotonically for the lifetime
/// of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    /// The period the fetch was issued for.
    pub period: PeriodKey,
    /// Selection generation the fetch belongs to.
    pub generation: u64,
    /// Issue order of the fetch.
    pub sequence: u64,
}

/// A snapshot that has been applied, together with everything derived from it.
///
/// Stage states, progress and metrics are computed once, when the snapshot
/// is applied, and never recomputed from anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSnapshot {
    /// Sequence of the fetch that produced the snapshot.
    pub sequence: u64,
    /// When the fetch completed.
    pub fetched_at: OffsetDateTime,
    /// The snapshot itself.
    pub snapshot: Arc<PipelineSnapshot>,
    /// Derived stage states.
    pub stages: StageStates,
    /// Derived progress.
    pub progress: PipelineProgress,
    /// Derived headline metrics.
    pub metrics: PipelineMetrics,
    /// Reasons the current stage is not complete.
    pub blockers: Vec<String>,
}

impl AppliedSnapshot {
    /// Derives stage states, progress and metrics from a snapshot.
    ///
    /// # Arguments
    ///
    /// * `sequence` - Sequence of the fetch that produced the snapshot
    /// * `fetched_at` - When the fetch completed
    /// * `snapshot` - The fetched snapshot
    #[must_use]
    pub fn derive(sequence: u64, fetched_at: OffsetDateTime, snapshot: PipelineSnapshot) -> Self {
        let stages: StageStates = evaluate(&snapshot);
        let progress: PipelineProgress = project(&stages);
        let metrics: PipelineMetrics = PipelineMetrics::from_snapshot(&snapshot);
        let blockers: Vec<String> = stage_blockers(&snapshot, &stages);

        Self {
            sequence,
            fetched_at,
            snapshot: Arc::new(snapshot),
            stages,
            progress,
            metrics,
            blockers,
        }
    }
}

/// Which stage detail panel is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageView {
    /// Follow the computed current stage.
    #[default]
    FollowCurrent,
    /// The operator chose a panel (or collapsed all of them).
    Pinned(Option<StageId>),
}

/// Coordinator state.
///
/// Immutable from the outside; a new state is produced by `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorState {
    /// The period being viewed, if one has been selected.
    pub active_period: Option<PeriodKey>,
    /// Incremented on every selection and on shutdown.
    pub generation: u64,
    /// Sequence number the next issued fetch will receive.
    pub next_sequence: u64,
    /// The fetch currently outstanding, at most one per coordinator.
    pub in_flight: Option<FetchTicket>,
    /// A fetch was requested while another was outstanding.
    pub follow_up_requested: bool,
    /// The most recent applied snapshot for the active period.
    pub current: Option<AppliedSnapshot>,
    /// Whether periodic polling is running.
    pub polling: bool,
    /// Fetch failures since the last success.
    pub consecutive_failures: u32,
    /// Description of the most recent fetch failure.
    pub last_error: Option<String>,
    /// Failures after which the staleness indicator escalates.
    pub failure_threshold: u32,
    /// Expanded stage panel.
    pub stage_view: StageView,
}

impl CoordinatorState {
    /// Creates an idle coordinator with no selected period.
    ///
    /// # Arguments
    ///
    /// * `failure_threshold` - Consecutive failures before escalation; a
    ///   value of zero is treated as one
    #[must_use]
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            active_period: None,
            generation: 0,
            next_sequence: 1,
            in_flight: None,
            follow_up_requested: false,
            current: None,
            polling: false,
            consecutive_failures: 0,
            last_error: None,
            failure_threshold: failure_threshold.max(1),
            stage_view: StageView::FollowCurrent,
        }
    }

    /// Issues a new fetch ticket for the active period and marks it in flight.
    pub(crate) const fn issue_ticket(&mut self, period: PeriodKey) -> FetchTicket {
        let ticket = FetchTicket {
            period,
            generation: self.generation,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.in_flight = Some(ticket);
        ticket
    }

    /// Returns true if a result for `ticket` may still be applied.
    #[must_use]
    pub fn accepts(&self, ticket: &FetchTicket) -> bool {
        self.active_period == Some(ticket.period)
            && self.generation == ticket.generation
            && self
                .current
                .as_ref()
                .is_none_or(|applied| applied.sequence < ticket.sequence)
    }

    /// Whether the last fetch failed, so the shown snapshot may be out of date.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.consecutive_failures > 0
    }

    /// Whether failures have reached the escalation threshold.
    #[must_use]
    pub const fn is_escalated(&self) -> bool {
        self.consecutive_failures >= self.failure_threshold
    }

    /// Whether the applied snapshot shows every stage completed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|applied| applied.progress.is_terminal)
    }

    /// Returns the state of a stage.
    ///
    /// Before any snapshot has been applied, only Upload is workable.
    #[must_use]
    pub fn stage_state(&self, stage: StageId) -> StageState {
        match &self.current {
            Some(applied) => applied.stages.get(stage),
            None if stage == StageId::Upload => StageState::InProgress,
            None => StageState::Locked,
        }
    }

    /// Returns the stage whose detail panel is expanded.
    #[must_use]
    pub fn expanded_stage(&self) -> Option<StageId> {
        match self.stage_view {
            StageView::FollowCurrent => self
                .current
                .as_ref()
                .map_or(Some(StageId::Upload), |applied| {
                    applied.progress.current_stage
                }),
            StageView::Pinned(stage) => stage,
        }
    }

    /// Builds the read model published to observers.
    #[must_use]
    pub fn view(&self) -> PipelineView {
        PipelineView {
            period: self.active_period,
            generation: self.generation,
            applied: self.current.clone(),
            fetching: self.in_flight.is_some(),
            polling: self.polling,
            stale: self.is_stale(),
            escalated: self.is_escalated(),
            consecutive_failures: self.consecutive_failures,
            last_error: self.last_error.clone(),
            expanded_stage: self.expanded_stage(),
        }
    }
}

impl Default for CoordinatorState {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

/// What observers see of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineView {
    /// The active period.
    pub period: Option<PeriodKey>,
    /// Selection generation.
    pub generation: u64,
    /// Latest applied snapshot and its derived values.
    pub applied: Option<AppliedSnapshot>,
    /// A fetch is outstanding.
    pub fetching: bool,
    /// Periodic polling is running.
    pub polling: bool,
    /// The last fetch failed.
    pub stale: bool,
    /// Failures reached the escalation threshold.
    pub escalated: bool,
    /// Fetch failures since the last success.
    pub consecutive_failures: u32,
    /// Description of the most recent fetch failure.
    pub last_error: Option<String>,
    /// Expanded stage panel.
    pub expanded_stage: Option<StageId>,
}

/// Side effects requested by a transition.
///
/// The core never performs I/O; the runtime executes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fetch a snapshot under the given ticket.
    Fetch(FetchTicket),
    /// Cancel all work belonging to a generation.
    CancelGeneration {
        /// The abandoned generation.
        generation: u64,
    },
    /// Start the poll timer for a period.
    StartPolling {
        /// The period to poll.
        period: PeriodKey,
        /// The generation the timer belongs to.
        generation: u64,
    },
    /// Stop the poll timer.
    StopPolling,
}

/// Why a fetch result was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The result belongs to a period or generation no longer active.
    StalePeriod,
    /// A newer result has already been applied.
    Superseded,
}

/// What a transition did, beyond its effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed.
    Unchanged,
    /// A fetch is outstanding; callers may wait for `sequence` to complete.
    Awaiting {
        /// Sequence of the fetch to wait for.
        sequence: u64,
    },
    /// A snapshot was applied.
    Applied {
        /// Sequence of the applied fetch.
        sequence: u64,
    },
    /// A fetch result was dropped.
    Discarded {
        /// Why it was dropped.
        reason: DiscardReason,
    },
    /// A fetch failure was recorded; the previous snapshot stays.
    FailureRecorded {
        /// Failures since the last success.
        consecutive_failures: u32,
        /// Whether the threshold has been reached.
        escalated: bool,
    },
    /// The expanded stage changed.
    StageViewChanged {
        /// The newly expanded stage, or `None` if collapsed.
        expanded: Option<StageId>,
    },
    /// The coordinator stopped.
    Stopped,
}

/// The result of applying a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state.
    pub new_state: CoordinatorState,
    /// Effects the runtime must execute, in order.
    pub effects: Vec<Effect>,
    /// What the transition did.
    pub outcome: Outcome,
}
