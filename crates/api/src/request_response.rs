// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use crate::error::{ApiError, translate_domain_error};
use residuals::{AppliedSnapshot, PipelineView};
use residuals_domain::{
    AuditRunResult, PeriodKey, PipelineMetrics, PipelineProgress, PipelineSnapshot, StageId,
    StageState,
};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Iso8601;

/// API request to switch the active period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectPeriodRequest {
    /// The period, as `YYYY-MM`.
    pub period: String,
}

/// API request to run the audit for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAuditRequest {
    /// The period, as `YYYY-MM`.
    pub period: String,
}

/// API response listing the periods an operator may pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodsResponse {
    /// The current period in the business time zone.
    pub current: PeriodKey,
    /// The period being viewed, if any.
    pub active: Option<PeriodKey>,
    /// Selectable periods in ascending order.
    pub periods: Vec<PeriodKey>,
}

/// One stage as shown in the pipeline view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResponse {
    /// Stage identifier.
    pub id: StageId,
    /// Operator-facing label.
    pub label: String,
    /// Derived state.
    pub state: StageState,
    /// Whether the stage's detail panel is expanded.
    pub expanded: bool,
}

/// API response describing everything the pipeline view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineViewResponse {
    /// The period being viewed.
    pub period: Option<PeriodKey>,
    /// Selection generation; changes whenever the period is switched.
    pub generation: u64,
    /// A fetch is outstanding.
    pub fetching: bool,
    /// Periodic polling is running.
    pub polling: bool,
    /// The last fetch failed; data shown may be out of date.
    pub stale: bool,
    /// Fetches have failed repeatedly and the operator should be warned.
    pub escalated: bool,
    /// Fetch failures since the last success.
    pub consecutive_failures: u32,
    /// Description of the most recent fetch failure.
    pub last_error: Option<String>,
    /// When the shown snapshot was fetched (ISO 8601).
    pub fetched_at: Option<String>,
    /// Stages in pipeline order; empty until the first snapshot arrives.
    pub stages: Vec<StageResponse>,
    /// Overall progress.
    pub progress: Option<PipelineProgress>,
    /// Label of the step to work on next.
    pub current_step: Option<String>,
    /// Whether the "month complete" celebration should show.
    pub celebrate: bool,
    /// Headline metrics.
    pub metrics: Option<PipelineMetrics>,
    /// Reasons the current stage is not complete.
    pub blockers: Vec<String>,
    /// The expanded stage panel.
    pub expanded_stage: Option<StageId>,
    /// The raw snapshot.
    pub snapshot: Option<PipelineSnapshot>,
}

impl From<&PipelineView> for PipelineViewResponse {
    fn from(view: &PipelineView) -> Self {
        let applied: Option<&AppliedSnapshot> = view.applied.as_ref();

        let stages: Vec<StageResponse> = applied
            .map(|applied| {
                applied
                    .stages
                    .iter()
                    .map(|(stage, state)| StageResponse {
                        id: stage,
                        label: stage.label().to_string(),
                        state,
                        expanded: view.expanded_stage == Some(stage),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            period: view.period,
            generation: view.generation,
            fetching: view.fetching,
            polling: view.polling,
            stale: view.stale,
            escalated: view.escalated,
            consecutive_failures: view.consecutive_failures,
            last_error: view.last_error.clone(),
            fetched_at: applied.and_then(|a| a.fetched_at.format(&Iso8601::DEFAULT).ok()),
            stages,
            progress: applied.map(|a| a.progress),
            current_step: applied.map(|a| a.progress.current_step_label().to_string()),
            celebrate: applied.is_some_and(|a| a.progress.should_celebrate()),
            metrics: applied.map(|a| a.metrics),
            blockers: applied.map(|a| a.blockers.clone()).unwrap_or_default(),
            expanded_stage: view.expanded_stage,
            snapshot: applied.map(|a| a.snapshot.as_ref().clone()),
        }
    }
}

/// API response for a clean audit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRunResponse {
    /// The run result.
    pub run: AuditRunResult,
    /// The pipeline view after the follow-up refresh.
    pub view: PipelineViewResponse,
}

/// Parses a `YYYY-MM` period from request input.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for malformed or out-of-range periods.
pub fn parse_period(input: &str) -> Result<PeriodKey, ApiError> {
    input.parse().map_err(translate_domain_error)
}

/// Parses a stage identifier from request input.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` for unknown stages.
pub fn parse_stage(input: &str) -> Result<StageId, ApiError> {
    input.parse().map_err(translate_domain_error)
}
