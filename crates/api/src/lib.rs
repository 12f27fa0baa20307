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
    clippy::unwrap_used,
    clippy::expect_used
)]

mod config;
mod coordinator;
mod error;
mod periods;
mod request_response;

#[cfg(test)]
mod tests;

pub use config::{
    CoordinatorConfig, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEZONE, DEFAULT_TRAILING_MONTHS,
    DEFAULT_UPCOMING_MONTHS,
};
pub use coordinator::PipelineCoordinator;
pub use error::{ApiError, FailingSource, translate_core_error, translate_domain_error};
pub use periods::list_periods;
pub use request_response::{
    AuditRunResponse, PeriodsResponse, PipelineViewResponse, RunAuditRequest,
    SelectPeriodRequest, StageResponse, parse_period, parse_stage,
};
