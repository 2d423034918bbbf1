//! Academic calendar arithmetic.
//!
//! An academic year runs from August 1 to May 31 of the following calendar
//! year and is identified by the calendar year it starts in (Aug 2024 to
//! May 2025 is academic year 2024). All wall-clock dates are interpreted in
//! Asia/Bangkok (UTC+07:00, no daylight saving) and stored as UTC.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Calendar month in which an academic year starts.
pub const ACADEMIC_YEAR_START_MONTH: u32 = 8;

/// Calendar month in which an academic year ends (of the following year).
pub const ACADEMIC_YEAR_END_MONTH: u32 = 5;

/// Fixed offset of the institution's local time from UTC.
pub const UTC_OFFSET_HOURS: i64 = 7;

const SECONDS_PER_DAY: i64 = 86_400;

/// Days per program year under [`WindowArithmetic::FixedDays`].
pub const DAYS_PER_PROGRAM_YEAR: i64 = 365;

// ---------------------------------------------------------------------------
// Local time conversion
// ---------------------------------------------------------------------------

/// Interpret a naive local wall-clock time as Bangkok time and convert to UTC.
pub fn local_to_utc(local: NaiveDateTime) -> Timestamp {
    (local - TimeDelta::hours(UTC_OFFSET_HOURS)).and_utc()
}

/// The Bangkok calendar date of a UTC instant.
pub fn local_date(instant: Timestamp) -> NaiveDate {
    (instant + TimeDelta::hours(UTC_OFFSET_HOURS)).date_naive()
}

/// 23:59:59 local time on `date`, as UTC.
pub fn local_end_of_day(date: NaiveDate) -> Option<Timestamp> {
    date.and_hms_opt(23, 59, 59).map(local_to_utc)
}

/// Whole days from `from` to `to`, rounded toward negative infinity.
///
/// A deadline 36 hours in the past is `-2` days away, not `-1`.
pub fn floor_days(from: Timestamp, to: Timestamp) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

// ---------------------------------------------------------------------------
// Academic years
// ---------------------------------------------------------------------------

/// The academic year code in effect at `now`.
pub fn current_academic_year(now: Timestamp) -> i32 {
    let today = local_date(now);
    if today.month() >= ACADEMIC_YEAR_START_MONTH {
        today.year()
    } else {
        today.year() - 1
    }
}

/// Default start and end instants for an academic year.
///
/// Start is August 1 00:00:00 local, end is May 31 23:59:59 local of the
/// next calendar year.
pub fn academic_year_bounds(year_code: i32) -> Option<(Timestamp, Timestamp)> {
    let start = NaiveDate::from_ymd_opt(year_code, ACADEMIC_YEAR_START_MONTH, 1)?
        .and_hms_opt(0, 0, 0)?;
    let end = NaiveDate::from_ymd_opt(year_code + 1, ACADEMIC_YEAR_END_MONTH, 31)?;
    Some((local_to_utc(start), local_end_of_day(end)?))
}

/// The calendar year in which `month` falls during `academic_year`.
///
/// August through December belong to the starting calendar year, January
/// through July to the following one.
pub fn calendar_year_for_month(academic_year: i32, month: u32) -> i32 {
    if month >= ACADEMIC_YEAR_START_MONTH {
        academic_year
    } else {
        academic_year + 1
    }
}

// ---------------------------------------------------------------------------
// Program window
// ---------------------------------------------------------------------------

/// How the end of a multi-year submission window is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowArithmetic {
    /// `start + 365 * duration_years` days, ignoring leap days.
    #[default]
    FixedDays,
    /// `start + duration_years` calendar years.
    Calendar,
}

impl WindowArithmetic {
    /// Parse the configuration value (`fixed_days` or `calendar`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed_days" => Some(Self::FixedDays),
            "calendar" => Some(Self::Calendar),
            _ => None,
        }
    }

    /// End of the window that starts at `start` and spans `duration_years`.
    pub fn window_end(self, start: Timestamp, duration_years: i32) -> Result<Timestamp, CoreError> {
        let overflow = || {
            CoreError::DateConstraintViolation(format!(
                "window of {duration_years} years from {start} is out of range"
            ))
        };
        match self {
            Self::FixedDays => start
                .checked_add_signed(TimeDelta::days(
                    DAYS_PER_PROGRAM_YEAR * i64::from(duration_years),
                ))
                .ok_or_else(overflow),
            Self::Calendar => {
                let months = u32::try_from(duration_years)
                    .ok()
                    .and_then(|years| years.checked_mul(12))
                    .ok_or_else(overflow)?;
                start.checked_add_months(Months::new(months)).ok_or_else(overflow)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn current_year_switches_in_august_local_time() {
        assert_eq!(current_academic_year(utc(2025, 7, 31, 12, 0, 0)), 2024);
        assert_eq!(current_academic_year(utc(2025, 8, 1, 0, 0, 0)), 2025);
        // 17:30 UTC on July 31 is already August 1 in Bangkok.
        assert_eq!(current_academic_year(utc(2025, 7, 31, 17, 30, 0)), 2025);
        assert_eq!(current_academic_year(utc(2026, 1, 15, 0, 0, 0)), 2025);
    }

    #[test]
    fn bounds_are_local_midnight_to_end_of_may() {
        let (start, end) = academic_year_bounds(2024).unwrap();
        assert_eq!(start, utc(2024, 7, 31, 17, 0, 0));
        assert_eq!(end, utc(2025, 5, 31, 16, 59, 59));
    }

    #[test]
    fn calendar_year_follows_academic_year_split() {
        assert_eq!(calendar_year_for_month(2024, 8), 2024);
        assert_eq!(calendar_year_for_month(2024, 12), 2024);
        assert_eq!(calendar_year_for_month(2024, 1), 2025);
        assert_eq!(calendar_year_for_month(2024, 5), 2025);
    }

    #[test]
    fn floor_days_rounds_down() {
        let now = utc(2025, 3, 10, 12, 0, 0);
        assert_eq!(floor_days(now, utc(2025, 3, 11, 11, 0, 0)), 0);
        assert_eq!(floor_days(now, utc(2025, 3, 12, 12, 0, 0)), 2);
        assert_eq!(floor_days(now, utc(2025, 3, 10, 11, 0, 0)), -1);
        assert_eq!(floor_days(now, utc(2025, 3, 8, 0, 0, 0)), -3);
    }

    #[test]
    fn local_end_of_day_is_late_afternoon_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(local_end_of_day(date).unwrap(), utc(2025, 3, 15, 16, 59, 59));
    }

    #[test]
    fn fixed_days_window_ignores_leap_days() {
        let start = utc(2024, 6, 1, 0, 0, 0);
        let end = WindowArithmetic::FixedDays.window_end(start, 4).unwrap();
        // 2024-06-01 + 1460 days; the 2028 leap day pulls it back to May 31.
        assert_eq!(end, utc(2028, 5, 31, 0, 0, 0));
    }

    #[test]
    fn calendar_window_adds_whole_years() {
        let start = utc(2024, 6, 1, 0, 0, 0);
        let end = WindowArithmetic::Calendar.window_end(start, 4).unwrap();
        assert_eq!(end, utc(2028, 6, 1, 0, 0, 0));
    }

    #[test]
    fn parse_window_arithmetic() {
        assert_eq!(WindowArithmetic::parse("fixed_days"), Some(WindowArithmetic::FixedDays));
        assert_eq!(WindowArithmetic::parse(" Calendar "), Some(WindowArithmetic::Calendar));
        assert_eq!(WindowArithmetic::parse("lunar"), None);
    }
}
