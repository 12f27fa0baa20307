// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur while constructing or parsing domain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A period was outside the supported calendar range.
    InvalidPeriod {
        /// The year that was supplied.
        year: i32,
        /// The month that was supplied (1-based).
        month: u8,
    },
    /// A period string could not be parsed as `YYYY-MM`.
    PeriodParseError {
        /// The string that failed to parse.
        input: String,
    },
    /// The declared business time zone is not a known IANA zone.
    InvalidTimezone(String),
    /// An upload state string was not recognized.
    InvalidUploadState(String),
    /// An audit state string was not recognized.
    InvalidAuditState(String),
    /// A stage identifier string was not recognized.
    InvalidStage(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPeriod { year, month } => {
                write!(
                    f,
                    "Invalid period {year}-{month:02}: year must be between 2000 and 2200 and month between 1 and 12"
                )
            }
            Self::PeriodParseError { input } => {
                write!(f, "Failed to parse period '{input}': expected YYYY-MM")
            }
            Self::InvalidTimezone(tz) => write!(f, "Invalid timezone: {tz}"),
            Self::InvalidUploadState(s) => write!(f, "Invalid upload state: {s}"),
            Self::InvalidAuditState(s) => write!(f, "Invalid audit state: {s}"),
            Self::InvalidStage(s) => write!(f, "Invalid stage: {s}"),
        }
    }
}

impl std::error::Error for DomainError {}
