// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pipeline coordinator state machine.
//!
//! The coordinator owns the active period, the latest applied snapshot and
//! the bookkeeping that keeps fetches honest: generations, sequence numbers,
//! the single in-flight fetch and failure counting. Every transition is a
//! pure function of the current state and a `Command`; I/O is described by
//! returned `Effect`s and executed elsewhere.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod apply;
mod command;
mod error;
mod state;

#[cfg(test)]
mod tests;

pub use apply::apply;
pub use command::Command;
pub use error::{AuditFailure, CoreError};
pub use state::{
    AppliedSnapshot, CoordinatorState, DEFAULT_FAILURE_THRESHOLD, DiscardReason, Effect,
    FetchTicket, Outcome, PipelineView, StageView, TransitionResult,
};
