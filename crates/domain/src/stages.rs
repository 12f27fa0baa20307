// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Stage evaluation for the residuals pipeline.
//!
//! Stage states are **computed**, not stored. They are a pure function of a
//! `PipelineSnapshot`, so they can never drift from the data they describe.
//!
//! ## Gating
//!
//! Stages run strictly in order: Upload, Compile, Assign, Audit. A stage is
//! `Locked` unless every earlier stage is `Completed`, so no later stage can
//! be in progress or complete ahead of its prerequisites.

use crate::error::DomainError;
use crate::types::{AuditState, PipelineSnapshot, UploadState};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The four sequential stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Processor files and the lead sheet are uploaded and validated.
    Upload,
    /// Uploaded records are compiled into the master sheet.
    Compile,
    /// Every record has a role assignment.
    Assign,
    /// Per-source audits pass.
    Audit,
}

impl StageId {
    /// All stages in pipeline order.
    pub const ALL: [Self; 4] = [Self::Upload, Self::Compile, Self::Assign, Self::Audit];

    /// Returns the string representation of the stage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Compile => "compile",
            Self::Assign => "assign",
            Self::Audit => "audit",
        }
    }

    /// Returns the operator-facing label of the stage.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Upload => "Upload Files",
            Self::Compile => "Compile Master Sheet",
            Self::Assign => "Assign Roles",
            Self::Audit => "Audit Residuals",
        }
    }

    /// Zero-based position in the pipeline.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Upload => 0,
            Self::Compile => 1,
            Self::Assign => 2,
            Self::Audit => 3,
        }
    }

    /// Returns the stage that follows this one, if any.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Upload => Some(Self::Compile),
            Self::Compile => Some(Self::Assign),
            Self::Assign => Some(Self::Audit),
            Self::Audit => None,
        }
    }
}

impl FromStr for StageId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(Self::Upload),
            "compile" => Ok(Self::Compile),
            "assign" => Ok(Self::Assign),
            "audit" => Ok(Self::Audit),
            _ => Err(DomainError::InvalidStage(s.to_string())),
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived state of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// An earlier stage is not complete.
    Locked,
    /// Prerequisites are met but this stage is not done.
    InProgress,
    /// The stage is done.
    Completed,
}

impl StageState {
    /// Returns the string representation of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Returns true if the stage is completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the stage is locked.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// The derived state of all four stages for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageStates {
    /// Upload stage state.
    pub upload: StageState,
    /// Compile stage state.
    pub compile: StageState,
    /// Assign stage state.
    pub assign: StageState,
    /// Audit stage state.
    pub audit: StageState,
}

impl StageStates {
    /// Returns the state of the given stage.
    #[must_use]
    pub const fn get(&self, stage: StageId) -> StageState {
        match stage {
            StageId::Upload => self.upload,
            StageId::Compile => self.compile,
            StageId::Assign => self.assign,
            StageId::Audit => self.audit,
        }
    }

    /// Iterates over `(stage, state)` pairs in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (StageId, StageState)> + '_ {
        StageId::ALL.into_iter().map(|stage| (stage, self.get(stage)))
    }

    /// The first stage that is not completed, or `None` once all four are.
    #[must_use]
    pub fn current_stage(&self) -> Option<StageId> {
        self.iter()
            .find(|(_, state)| !state.is_completed())
            .map(|(stage, _)| stage)
    }
}

/// Returns `state` if the prerequisite stage is completed, otherwise `Locked`.
const fn gate(prerequisite: StageState, state: StageState) -> StageState {
    if prerequisite.is_completed() {
        state
    } else {
        StageState::Locked
    }
}

const fn completed_if(condition: bool) -> StageState {
    if condition {
        StageState::Completed
    } else {
        StageState::InProgress
    }
}

/// Upload is complete when every source and the lead sheet are validated
/// and there is at least one record. Upload is never locked.
fn evaluate_upload(snapshot: &PipelineSnapshot) -> StageState {
    let sources_validated = snapshot
        .sources
        .iter()
        .all(|s| s.upload_state.is_validated());
    let lead_sheet_validated = snapshot.lead_sheet.upload_state.is_validated();

    completed_if(sources_validated && lead_sheet_validated && snapshot.total_records() > 0)
}

/// Compilation follows automatically from a completed upload; upstream
/// reports no independent compile failure.
fn evaluate_compile(snapshot: &PipelineSnapshot) -> StageState {
    completed_if(snapshot.total_records() > 0)
}

/// An unloaded summary is "loading", never "complete", whatever its counts.
const fn evaluate_assign(snapshot: &PipelineSnapshot) -> StageState {
    match snapshot.assignment.unassigned() {
        Some(0) => StageState::Completed,
        Some(_) | None => StageState::InProgress,
    }
}

/// Audit is complete when at least one result exists, every result passed,
/// and every source has a result.
fn evaluate_audit(snapshot: &PipelineSnapshot) -> StageState {
    let all_passed = !snapshot.audits.is_empty() && snapshot.audits.iter().all(|a| a.passed());
    let all_covered = snapshot
        .sources
        .iter()
        .all(|s| snapshot.audit_for(&s.source_id).is_some());

    completed_if(all_passed && all_covered)
}

/// Derives every stage state from a snapshot.
///
/// Pure and deterministic. Gating is applied in order, so a stage is only
/// evaluated on its own merits once the stage before it is completed.
#[must_use]
pub fn evaluate(snapshot: &PipelineSnapshot) -> StageStates {
    let upload = evaluate_upload(snapshot);
    let compile = gate(upload, evaluate_compile(snapshot));
    let assign = gate(compile, evaluate_assign(snapshot));
    let audit = gate(assign, evaluate_audit(snapshot));

    StageStates {
        upload,
        compile,
        assign,
        audit,
    }
}

/// Explains why the current stage has not completed.
///
/// Returns an empty list when the pipeline is complete.
#[must_use]
pub fn stage_blockers(snapshot: &PipelineSnapshot, states: &StageStates) -> Vec<String> {
    let mut reasons = Vec::new();

    match states.current_stage() {
        Some(StageId::Upload) => {
            for source in &snapshot.sources {
                match source.upload_state {
                    UploadState::Validated => {}
                    UploadState::NeedsUpload => {
                        reasons.push(format!("'{}' needs upload", source.source_name));
                    }
                    UploadState::Error => {
                        reasons.push(format!("'{}' upload has errors", source.source_name));
                    }
                }
            }
            if !snapshot.lead_sheet.upload_state.is_validated() {
                reasons.push(String::from("Lead sheet has not been validated"));
            }
            if snapshot.total_records() == 0 {
                reasons.push(String::from("No records have been uploaded"));
            }
        }
        Some(StageId::Compile) => {
            reasons.push(String::from("No records available to compile"));
        }
        Some(StageId::Assign) => match snapshot.assignment.unassigned() {
            None => reasons.push(String::from("Assignment summary is still loading")),
            Some(count) => reasons.push(format!("{count} records are unassigned")),
        },
        Some(StageId::Audit) => {
            if snapshot.audits.is_empty() {
                reasons.push(String::from("Audit has not been run"));
            }
            for audit in &snapshot.audits {
                match audit.audit_state {
                    AuditState::Passed => {}
                    AuditState::Pending => {
                        reasons.push(format!("Audit pending for '{}'", audit.source_name));
                    }
                    AuditState::Failed => {
                        reasons.push(format!(
                            "Audit failed for '{}': {}",
                            audit.source_name,
                            audit.issues.join("; ")
                        ));
                    }
                }
            }
            for source in &snapshot.sources {
                if !snapshot.audits.is_empty() && snapshot.audit_for(&source.source_id).is_none() {
                    reasons.push(format!("No audit result for '{}'", source.source_name));
                }
            }
        }
        None => {}
    }

    reasons
}
