// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::backend::Subsystem;
use residuals_domain::PeriodKey;
use thiserror::Error;

/// Errors from a single upstream call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The subsystem is not reachable.
    #[error("{0}")]
    Unavailable(String),

    /// The configured base URL is unusable.
    #[error("invalid upstream URL '{0}'")]
    InvalidUrl(String),
}

/// A snapshot could not be assembled because one subsystem read failed.
#[derive(Debug, Error)]
#[error("failed to read {subsystem} status for {period}: {source}")]
pub struct SnapshotError {
    /// The period being read.
    pub period: PeriodKey,
    /// The subsystem whose read failed.
    pub subsystem: Subsystem,
    /// The underlying failure.
    #[source]
    pub source: UpstreamError,
}

impl SnapshotError {
    /// Creates a new `SnapshotError`.
    #[must_use]
    pub const fn new(period: PeriodKey, subsystem: Subsystem, source: UpstreamError) -> Self {
        Self {
            period,
            subsystem,
            source,
        }
    }
}
