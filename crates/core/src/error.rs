// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use residuals_domain::{AuditRunResult, DomainError, PeriodKey, StageId};

/// One failing source reported by an audit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFailure {
    /// The processor that failed.
    pub source_id: String,
    /// Display name of the processor.
    pub source_name: String,
    /// Issues reported by the audit.
    pub issues: Vec<String>,
}

/// Errors produced by the pipeline coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The command needs a selected period and none is selected.
    NoActivePeriod,
    /// The requested stage's prerequisites are not met.
    ///
    /// Advisory only; nothing needs to be retried.
    StageLocked {
        /// The stage that was requested.
        stage: StageId,
    },
    /// One or more upstream reads failed; the last good snapshot is kept.
    SnapshotUnavailable {
        /// The period that could not be read.
        period: PeriodKey,
        /// Description of the failure.
        reason: String,
    },
    /// The audit run failed outright or reported failing sources.
    AuditRunFailed {
        /// The audited period.
        period: PeriodKey,
        /// Transport or service failure, if the run itself failed.
        reason: Option<String>,
        /// Sources that failed their audit.
        failures: Vec<AuditFailure>,
    },
}

impl CoreError {
    /// Builds an `AuditRunFailed` error from a run result, if any source failed.
    #[must_use]
    pub fn from_audit_run(run: &AuditRunResult) -> Option<Self> {
        let failures: Vec<AuditFailure> = run
            .failures()
            .into_iter()
            .map(|r| AuditFailure {
                source_id: r.source_id.clone(),
                source_name: r.source_name.clone(),
                issues: r.issues.clone(),
            })
            .collect();

        if failures.is_empty() {
            None
        } else {
            Some(Self::AuditRunFailed {
                period: run.period,
                reason: None,
                failures,
            })
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::NoActivePeriod => write!(f, "No period is selected"),
            Self::StageLocked { stage } => {
                write!(
                    f,
                    "Stage '{}' is locked until earlier stages complete",
                    stage.label()
                )
            }
            Self::SnapshotUnavailable { period, reason } => {
                write!(f, "Pipeline status for {period} is unavailable: {reason}")
            }
            Self::AuditRunFailed {
                period,
                reason,
                failures,
            } => {
                write!(f, "Audit run for {period} failed")?;
                if let Some(reason) = reason {
                    write!(f, ": {reason}")?;
                }
                if !failures.is_empty() {
                    let names: Vec<&str> =
                        failures.iter().map(|fl| fl.source_name.as_str()).collect();
                    write!(f, " ({} failing: {})", failures.len(), names.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
