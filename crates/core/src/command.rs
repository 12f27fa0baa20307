// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::state::FetchTicket;
use residuals_domain::{PeriodKey, PipelineSnapshot, StageId};
use time::OffsetDateTime;

/// A command represents operator intent or a completed I/O event as data only.
///
/// Commands are the only way to change coordinator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch the active period.
    SelectPeriod {
        /// The period to activate.
        period: PeriodKey,
    },
    /// The poll timer fired.
    PollTick,
    /// Operator asked for fresh data now.
    Refresh,
    /// A mutating upstream call (such as an audit run) finished, successfully
    /// or not.
    MutationCompleted {
        /// The period the mutation targeted.
        period: PeriodKey,
    },
    /// A snapshot fetch returned data.
    FetchSucceeded {
        /// The ticket the fetch was issued under.
        ticket: FetchTicket,
        /// The fetched snapshot.
        snapshot: PipelineSnapshot,
        /// When the fetch completed.
        fetched_at: OffsetDateTime,
    },
    /// A snapshot fetch failed.
    FetchFailed {
        /// The ticket the fetch was issued under.
        ticket: FetchTicket,
        /// Description of the failure.
        reason: String,
    },
    /// Expand or collapse a stage's detail panel.
    ToggleStageView {
        /// The stage to toggle.
        stage: StageId,
    },
    /// Stop all polling and discard any in-flight work.
    Shutdown,
}
