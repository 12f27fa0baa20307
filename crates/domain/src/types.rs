// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::period::PeriodKey;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Upload state of a processor file or the lead sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    /// The file was uploaded and passed validation.
    Validated,
    /// No usable file has been uploaded for the period yet.
    NeedsUpload,
    /// The uploaded file was rejected.
    Error,
}

impl UploadState {
    /// Returns the string representation of this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validated => "validated",
            Self::NeedsUpload => "needs_upload",
            Self::Error => "error",
        }
    }

    /// Returns true if the upload is usable by later stages.
    #[must_use]
    pub const fn is_validated(&self) -> bool {
        matches!(self, Self::Validated)
    }
}

impl FromStr for UploadState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validated" => Ok(Self::Validated),
            "needs_upload" => Ok(Self::NeedsUpload),
            "error" => Ok(Self::Error),
            _ => Err(DomainError::InvalidUploadState(s.to_string())),
        }
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit outcome for one source in one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditState {
    /// All audit rules passed.
    Passed,
    /// The audit has not run or has not finished.
    Pending,
    /// At least one audit rule failed.
    Failed,
}

impl AuditState {
    /// Returns the string representation of this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for AuditState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(Self::Passed),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            _ => Err(DomainError::InvalidAuditState(s.to_string())),
        }
    }
}

impl std::fmt::Display for AuditState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upload status of one processor's monthly file.
///
/// Owned by the upload subsystem; the coordinator only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    /// Stable identifier of the processor.
    pub source_id: String,
    /// Display name of the processor.
    pub source_name: String,
    /// Current upload state.
    pub upload_state: UploadState,
    /// Number of records in the uploaded file.
    pub record_count: u64,
    /// Revenue represented by the file, in cents.
    pub revenue_total_cents: i64,
    /// When the upload subsystem last changed this entry (ISO 8601).
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl SourceStatus {
    /// Creates a new `SourceStatus` with no last-updated timestamp.
    ///
    /// # Arguments
    ///
    /// * `source_id` - Stable identifier of the processor
    /// * `source_name` - Display name of the processor
    /// * `upload_state` - Current upload state
    /// * `record_count` - Number of records in the file
    /// * `revenue_total_cents` - Revenue in cents
    #[must_use]
    pub fn new(
        source_id: &str,
        source_name: &str,
        upload_state: UploadState,
        record_count: u64,
        revenue_total_cents: i64,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            source_name: source_name.to_string(),
            upload_state,
            record_count,
            revenue_total_cents,
            last_updated: None,
        }
    }
}

/// Status of the master lead sheet for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSheetStatus {
    /// Current upload state.
    pub upload_state: UploadState,
    /// Number of leads in the sheet.
    pub record_count: u64,
}

impl LeadSheetStatus {
    /// Creates a new `LeadSheetStatus`.
    #[must_use]
    pub const fn new(upload_state: UploadState, record_count: u64) -> Self {
        Self {
            upload_state,
            record_count,
        }
    }

    /// Lead sheet that has not been uploaded.
    #[must_use]
    pub const fn missing() -> Self {
        Self::new(UploadState::NeedsUpload, 0)
    }
}

/// Role assignment counts for a period.
///
/// `loaded == false` means the assignment subsystem has not answered yet.
/// The counts of an unloaded summary carry no meaning and must never be
/// read as "nothing left to assign".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    /// Records with no role assignment.
    pub unassigned_count: u64,
    /// Records whose assignment was carried over from a previous period.
    pub previously_assigned_count: u64,
    /// Whether the summary has arrived.
    pub loaded: bool,
}

impl AssignmentSummary {
    /// Summary that has not arrived yet.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            unassigned_count: 0,
            previously_assigned_count: 0,
            loaded: false,
        }
    }

    /// Summary reported by the assignment subsystem.
    #[must_use]
    pub const fn loaded(unassigned_count: u64, previously_assigned_count: u64) -> Self {
        Self {
            unassigned_count,
            previously_assigned_count,
            loaded: true,
        }
    }

    /// Returns the unassigned count only if the summary has loaded.
    #[must_use]
    pub const fn unassigned(&self) -> Option<u64> {
        if self.loaded {
            Some(self.unassigned_count)
        } else {
            None
        }
    }

    /// Returns the previously assigned count only if the summary has loaded.
    #[must_use]
    pub const fn previously_assigned(&self) -> Option<u64> {
        if self.loaded {
            Some(self.previously_assigned_count)
        } else {
            None
        }
    }
}

impl Default for AssignmentSummary {
    fn default() -> Self {
        Self::pending()
    }
}

/// Audit outcome for one source in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    /// The processor this result belongs to.
    pub source_id: String,
    /// Display name of the processor.
    pub source_name: String,
    /// The audit state.
    pub audit_state: AuditState,
    /// Issues found by the audit; empty when passed.
    #[serde(default)]
    pub issues: Vec<String>,
}

impl AuditResult {
    /// Creates a new `AuditResult`.
    #[must_use]
    pub fn new(
        source_id: &str,
        source_name: &str,
        audit_state: AuditState,
        issues: Vec<String>,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            source_name: source_name.to_string(),
            audit_state,
            issues,
        }
    }

    /// Returns true if the audit passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.audit_state, AuditState::Passed)
    }
}

/// Result of asking the audit subsystem to run.
///
/// A run may partially succeed: some sources pass while others fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRunResult {
    /// The audited period.
    pub period: PeriodKey,
    /// Per-source outcomes of this run.
    pub results: Vec<AuditResult>,
}

impl AuditRunResult {
    /// Returns the per-source results that failed.
    #[must_use]
    pub fn failures(&self) -> Vec<&AuditResult> {
        self.results
            .iter()
            .filter(|r| r.audit_state == AuditState::Failed)
            .collect()
    }

    /// Returns true if no source failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.audit_state != AuditState::Failed)
    }
}

/// Point-in-time aggregate of every upstream status for one period.
///
/// A snapshot is an immutable value. Newer information produces a new
/// snapshot that replaces the old one as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// The period this snapshot describes.
    pub period: PeriodKey,
    /// Per-processor upload status.
    pub sources: Vec<SourceStatus>,
    /// Lead sheet status.
    pub lead_sheet: LeadSheetStatus,
    /// Role assignment summary.
    pub assignment: AssignmentSummary,
    /// Per-source audit results.
    pub audits: Vec<AuditResult>,
}

impl PipelineSnapshot {
    /// Creates a new snapshot.
    #[must_use]
    pub const fn new(
        period: PeriodKey,
        sources: Vec<SourceStatus>,
        lead_sheet: LeadSheetStatus,
        assignment: AssignmentSummary,
        audits: Vec<AuditResult>,
    ) -> Self {
        Self {
            period,
            sources,
            lead_sheet,
            assignment,
            audits,
        }
    }

    /// Sum of record counts across all sources.
    #[must_use]
    pub fn total_records(&self) -> u64 {
        self.sources.iter().map(|s| s.record_count).sum()
    }

    /// Sum of revenue across all sources, in cents.
    #[must_use]
    pub fn total_revenue_cents(&self) -> i64 {
        self.sources.iter().map(|s| s.revenue_total_cents).sum()
    }

    /// Number of sources whose upload is validated.
    #[must_use]
    pub fn validated_source_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.upload_state.is_validated())
            .count()
    }

    /// Returns the audit result for a source, if one exists.
    #[must_use]
    pub fn audit_for(&self, source_id: &str) -> Option<&AuditResult> {
        self.audits.iter().find(|a| a.source_id == source_id)
    }
}
