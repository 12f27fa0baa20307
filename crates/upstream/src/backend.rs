// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::UpstreamError;
use async_trait::async_trait;
use residuals_domain::{
    AssignmentSummary, AuditResult, AuditRunResult, LeadSheetStatus, PeriodKey, SourceStatus,
};
use serde::{Deserialize, Serialize};

/// The upstream subsystems a snapshot is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    /// Processor file uploads.
    Uploads,
    /// The master lead sheet.
    LeadSheet,
    /// Role assignments.
    Assignments,
    /// Residual audits.
    Audits,
}

impl Subsystem {
    /// All subsystems.
    pub const ALL: [Self; 4] = [
        Self::Uploads,
        Self::LeadSheet,
        Self::Assignments,
        Self::Audits,
    ];

    /// Returns the string representation of the subsystem.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uploads => "uploads",
            Self::LeadSheet => "lead_sheet",
            Self::Assignments => "assignments",
            Self::Audits => "audits",
        }
    }
}

impl std::fmt::Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read and command access to the subsystems that own pipeline data.
///
/// The coordinator treats every answer as authoritative for the moment it
/// was read and never writes upstream data itself, except by asking the
/// audit subsystem to run.
#[async_trait]
pub trait ResidualsBackend: Send + Sync {
    /// Per-processor upload status for a period.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload subsystem cannot be read.
    async fn source_statuses(&self, period: PeriodKey) -> Result<Vec<SourceStatus>, UpstreamError>;

    /// Lead sheet status for a period.
    ///
    /// # Errors
    ///
    /// Returns an error if the lead sheet cannot be read.
    async fn lead_sheet_status(&self, period: PeriodKey) -> Result<LeadSheetStatus, UpstreamError>;

    /// Role assignment summary for a period.
    ///
    /// An unloaded summary is a successful answer, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the assignment subsystem cannot be read.
    async fn assignment_summary(
        &self,
        period: PeriodKey,
    ) -> Result<AssignmentSummary, UpstreamError>;

    /// Audit results for a period.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit subsystem cannot be read.
    async fn audit_results(&self, period: PeriodKey) -> Result<Vec<AuditResult>, UpstreamError>;

    /// Asks the audit subsystem to audit a period.
    ///
    /// # Errors
    ///
    /// Returns an error if the run could not be performed.
    async fn run_audit(&self, period: PeriodKey) -> Result<AuditRunResult, UpstreamError>;
}
