// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Business calendar helpers.
//!
//! The "current" period is a wall-clock notion: an instant late on the last
//! day of a month in the declared business time zone is still that month,
//! even when it is already the next month in UTC.

use crate::error::DomainError;
use crate::period::PeriodKey;
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

/// Parses an IANA time zone name.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimezone` if the name is not a known zone.
pub fn parse_timezone(timezone: &str) -> Result<Tz, DomainError> {
    timezone
        .parse()
        .map_err(|_| DomainError::InvalidTimezone(timezone.to_string()))
}

/// Derives the processing period containing `now` in the given time zone.
///
/// # Arguments
///
/// * `timezone` - The declared business time zone (e.g. `America/New_York`)
/// * `now` - The instant to evaluate
///
/// # Errors
///
/// Returns an error if the time zone is unknown or the local date falls
/// outside the supported period range.
pub fn current_period(timezone: &str, now: DateTime<Utc>) -> Result<PeriodKey, DomainError> {
    let tz: Tz = parse_timezone(timezone)?;
    let local = now.with_timezone(&tz);

    // chrono months are 1..=12, always fit in u8
    let month: u8 = u8::try_from(local.month()).map_err(|_| DomainError::InvalidPeriod {
        year: local.year(),
        month: 0,
    })?;

    PeriodKey::new(local.year(), month)
}
