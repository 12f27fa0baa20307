// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod calendar;
mod error;
mod period;
mod progress;
mod stages;
mod types;

#[cfg(test)]
mod tests;

pub use calendar::{current_period, parse_timezone};
pub use error::DomainError;
pub use period::{PeriodKey, selectable_periods};
pub use progress::{PipelineMetrics, PipelineProgress, project};
pub use stages::{StageId, StageState, StageStates, evaluate, stage_blockers};
pub use types::{
    AssignmentSummary, AuditResult, AuditRunResult, AuditState, LeadSheetStatus,
    PipelineSnapshot, SourceStatus, UploadState,
};
