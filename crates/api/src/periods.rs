// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::config::CoordinatorConfig;
use crate::error::{ApiError, translate_domain_error};
use crate::request_response::PeriodsResponse;
use chrono::{DateTime, Utc};
use residuals_domain::{PeriodKey, current_period, selectable_periods};

/// Lists the periods an operator may select at `now`.
///
/// # Arguments
///
/// * `config` - Supplies the business time zone and window size
/// * `active` - The period currently being viewed, if any
/// * `now` - The instant to evaluate
///
/// # Errors
///
/// Returns an error if the configured time zone is unknown.
pub fn list_periods(
    config: &CoordinatorConfig,
    active: Option<PeriodKey>,
    now: DateTime<Utc>,
) -> Result<PeriodsResponse, ApiError> {
    let current: PeriodKey = current_period(&config.timezone, now).map_err(translate_domain_error)?;
    let periods: Vec<PeriodKey> =
        selectable_periods(current, config.trailing_months, config.upcoming_months);

    Ok(PeriodsResponse {
        current,
        active,
        periods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_list_periods_window_around_current() {
        let config: CoordinatorConfig = CoordinatorConfig {
            trailing_months: 2,
            upcoming_months: 1,
            ..CoordinatorConfig::default()
        };
        let Some(now) = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).single() else {
            panic!("invalid test instant");
        };

        let Ok(response) = list_periods(&config, None, now) else {
            panic!("listing should succeed");
        };

        let names: Vec<String> = response.periods.iter().map(ToString::to_string).collect();
        assert_eq!(response.current.to_string(), "2026-01");
        assert_eq!(names, vec!["2025-11", "2025-12", "2026-01", "2026-02"]);
    }

    #[test]
    fn test_list_periods_uses_business_timezone() {
        let config: CoordinatorConfig = CoordinatorConfig::default();
        // Still January 31 in New York.
        let Some(now) = Utc.with_ymd_and_hms(2026, 2, 1, 3, 0, 0).single() else {
            panic!("invalid test instant");
        };

        let Ok(response) = list_periods(&config, None, now) else {
            panic!("listing should succeed");
        };

        assert_eq!(response.current.to_string(), "2026-01");
        assert_eq!(response.periods.len(), 15);
    }
}
