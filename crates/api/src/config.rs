// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::{ApiError, translate_domain_error};
use residuals::DEFAULT_FAILURE_THRESHOLD;
use residuals_domain::parse_timezone;
use std::time::Duration;

/// Default interval between polls of a non-terminal period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of selectable months before the current one.
pub const DEFAULT_TRAILING_MONTHS: u32 = 12;

/// Default number of selectable months after the current one.
pub const DEFAULT_UPCOMING_MONTHS: u32 = 2;

/// Default business time zone.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Coordinator runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Interval between polls while the pipeline is not terminal.
    pub poll_interval: Duration,
    /// Consecutive fetch failures before the stale indicator escalates.
    pub failure_escalation_threshold: u32,
    /// Selectable months before the current period.
    pub trailing_months: u32,
    /// Selectable months after the current period.
    pub upcoming_months: u32,
    /// IANA time zone that decides which month is current.
    pub timezone: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            failure_escalation_threshold: DEFAULT_FAILURE_THRESHOLD,
            trailing_months: DEFAULT_TRAILING_MONTHS,
            upcoming_months: DEFAULT_UPCOMING_MONTHS,
            timezone: String::from(DEFAULT_TIMEZONE),
        }
    }
}

impl CoordinatorConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the poll interval or failure
    /// threshold is zero, or the time zone is unknown.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.poll_interval.is_zero() {
            return Err(ApiError::InvalidInput {
                field: String::from("poll_interval"),
                message: String::from("Poll interval must be greater than zero"),
            });
        }

        if self.failure_escalation_threshold == 0 {
            return Err(ApiError::InvalidInput {
                field: String::from("failure_escalation_threshold"),
                message: String::from("Failure threshold must be greater than zero"),
            });
        }

        parse_timezone(&self.timezone).map_err(translate_domain_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config: CoordinatorConfig = CoordinatorConfig::default();

        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.failure_escalation_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config: CoordinatorConfig = CoordinatorConfig {
            poll_interval: Duration::ZERO,
            ..CoordinatorConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ApiError::InvalidInput { field, .. }) if field == "poll_interval"
        ));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config: CoordinatorConfig = CoordinatorConfig {
            failure_escalation_threshold: 0,
            ..CoordinatorConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let config: CoordinatorConfig = CoordinatorConfig {
            timezone: String::from("Europe/Atlantis"),
            ..CoordinatorConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ApiError::InvalidInput { field, .. }) if field == "timezone"
        ));
    }
}
