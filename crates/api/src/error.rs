// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use residuals::{AuditFailure, CoreError};
use residuals_domain::{DomainError, PeriodKey, StageId};
use serde::{Deserialize, Serialize};

/// A source that failed an audit run, as reported to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailingSource {
    /// The processor that failed.
    pub source_id: String,
    /// Display name of the processor.
    pub source_name: String,
    /// Issues reported by the audit.
    pub issues: Vec<String>,
}

impl From<AuditFailure> for FailingSource {
    fn from(failure: AuditFailure) -> Self {
        Self {
            source_id: failure.source_id,
            source_name: failure.source_name,
            issues: failure.issues,
        }
    }
}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// The operation needs a selected period.
    NoActivePeriod,
    /// The requested stage is locked. Advisory only.
    StageLocked {
        /// The requested stage.
        stage: StageId,
        /// A human-readable description.
        message: String,
    },
    /// Pipeline status could not be read; the last good snapshot is kept.
    SnapshotUnavailable {
        /// The period that could not be read.
        period: PeriodKey,
        /// A human-readable description of the failure.
        message: String,
    },
    /// An audit run failed or reported failing sources.
    AuditRunFailed {
        /// The audited period.
        period: PeriodKey,
        /// A human-readable description of the failure.
        message: String,
        /// The sources that failed, if the run completed.
        failing_sources: Vec<FailingSource>,
    },
    /// The coordinator has been shut down.
    ShutDown,
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::NoActivePeriod => write!(f, "No period is selected"),
            Self::StageLocked { message, .. }
            | Self::SnapshotUnavailable { message, .. }
            | Self::AuditRunFailed { message, .. } => write!(f, "{message}"),
            Self::ShutDown => write!(f, "The pipeline coordinator has been shut down"),
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let field: &str = match &err {
        DomainError::InvalidPeriod { .. } | DomainError::PeriodParseError { .. } => "period",
        DomainError::InvalidTimezone(_) => "timezone",
        DomainError::InvalidUploadState(_) => "upload_state",
        DomainError::InvalidAuditState(_) => "audit_state",
        DomainError::InvalidStage(_) => "stage",
    };

    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    let message: String = err.to_string();

    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::NoActivePeriod => ApiError::NoActivePeriod,
        CoreError::StageLocked { stage } => ApiError::StageLocked { stage, message },
        CoreError::SnapshotUnavailable { period, .. } => {
            ApiError::SnapshotUnavailable { period, message }
        }
        CoreError::AuditRunFailed {
            period, failures, ..
        } => ApiError::AuditRunFailed {
            period,
            message,
            failing_sources: failures.into_iter().map(FailingSource::from).collect(),
        },
    }
}
