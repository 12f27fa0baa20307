// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Processing period model.
//!
//! A residuals period is one calendar month. Periods are totally ordered
//! and enumerable so the operator can pick from a window of recent and
//! upcoming months.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, Month};

/// Earliest year accepted for a processing period.
const MIN_YEAR: i32 = 2000;

/// Latest year accepted for a processing period.
const MAX_YEAR: i32 = 2200;

/// Identifies one calendar month's residuals processing cycle.
///
/// Two keys are equal iff they name the same calendar month. Ordering is
/// chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey {
    /// Calendar year.
    year: i32,
    /// Calendar month, 1-based.
    month: u8,
}

impl PeriodKey {
    /// Creates a new period key.
    ///
    /// # Arguments
    ///
    /// * `year` - The calendar year (2000 through 2200)
    /// * `month` - The calendar month, 1-based
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriod` if either component is out of range.
    pub const fn new(year: i32, month: u8) -> Result<Self, DomainError> {
        if year < MIN_YEAR || year > MAX_YEAR || month < 1 || month > 12 {
            return Err(DomainError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// Creates the period containing the given date.
    ///
    /// # Errors
    ///
    /// Returns an error if the date's year is outside the supported range.
    pub fn from_date(date: Date) -> Result<Self, DomainError> {
        Self::new(date.year(), u8::from(date.month()))
    }

    /// Returns the calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the calendar month.
    #[must_use]
    pub fn month(&self) -> Month {
        // Constructor guarantees 1..=12.
        Month::try_from(self.month).unwrap_or(Month::January)
    }

    /// Returns the 1-based month number.
    #[must_use]
    pub const fn month_number(&self) -> u8 {
        self.month
    }

    /// Returns the first day of the period.
    #[must_use]
    pub fn first_day(&self) -> Option<Date> {
        Date::from_calendar_date(self.year, self.month(), 1).ok()
    }

    /// Months elapsed since January of year zero; used for arithmetic.
    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + (i64::from(self.month) - 1)
    }

    fn from_ordinal(ordinal: i64) -> Option<Self> {
        let year: i32 = i32::try_from(ordinal.div_euclid(12)).ok()?;
        let month: u8 = u8::try_from(ordinal.rem_euclid(12) + 1).ok()?;
        Self::new(year, month).ok()
    }

    /// Returns the period `months` away from this one.
    ///
    /// Returns `None` if the result falls outside the supported range.
    #[must_use]
    pub fn offset(&self, months: i32) -> Option<Self> {
        Self::from_ordinal(self.ordinal() + i64::from(months))
    }

    /// Returns the following month.
    #[must_use]
    pub fn succ(&self) -> Option<Self> {
        self.offset(1)
    }

    /// Returns the preceding month.
    #[must_use]
    pub fn pred(&self) -> Option<Self> {
        self.offset(-1)
    }

    /// Number of months from `self` to `other` (negative if `other` is earlier).
    #[must_use]
    pub fn months_until(&self, other: &Self) -> i64 {
        other.ordinal() - self.ordinal()
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = || DomainError::PeriodParseError {
            input: s.to_string(),
        };

        let (year_str, month_str) = s.trim().split_once('-').ok_or_else(parse_error)?;
        if year_str.len() != 4 || month_str.is_empty() || month_str.len() > 2 {
            return Err(parse_error());
        }

        let year: i32 = year_str.parse().map_err(|_| parse_error())?;
        let month: u8 = month_str.parse().map_err(|_| parse_error())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(period: PeriodKey) -> Self {
        period.to_string()
    }
}

/// Enumerates the periods an operator may select.
///
/// The window runs from `trailing` months before `anchor` through
/// `upcoming` months after it, inclusive of `anchor`, in ascending order.
/// Months outside the supported range are skipped.
///
/// # Arguments
///
/// * `anchor` - Usually the current period
/// * `trailing` - Number of months before the anchor
/// * `upcoming` - Number of months after the anchor
#[must_use]
pub fn selectable_periods(anchor: PeriodKey, trailing: u32, upcoming: u32) -> Vec<PeriodKey> {
    let start: i64 = -i64::from(trailing);
    let end: i64 = i64::from(upcoming);

    (start..=end)
        .filter_map(|delta| PeriodKey::from_ordinal(anchor.ordinal() + delta))
        .collect()
}
