//! Program requirement (requirement template) rules.
//!
//! A program requirement is a yearly-recurring rule: students of a program
//! in their `target_year` must submit a certificate of a given type by
//! `deadline_day`/`deadline_month`. These functions hold the constraints
//! shared by create, update, archive and the periodic planner.

use crate::error::CoreError;

/// Grace period applied when a requirement does not specify one.
pub const DEFAULT_GRACE_PERIOD_DAYS: i32 = 7;

/// Notification lead time applied when a requirement does not specify one.
pub const DEFAULT_NOTIFICATION_DAYS: i32 = 90;

/// Days per month in a non-leap reference year. February is capped at 28 so
/// a recurring deadline exists every year.
pub const MONTH_MAX_DAYS: [i32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// Check that `(day, month)` is a date in every calendar year.
pub fn validate_deadline(day: i32, month: i32) -> Result<(), CoreError> {
    let max_day = usize::try_from(month - 1)
        .ok()
        .and_then(|idx| MONTH_MAX_DAYS.get(idx))
        .ok_or_else(|| {
            CoreError::DateConstraintViolation(format!("deadline month {month} is not 1-12"))
        })?;
    if day < 1 || day > *max_day {
        return Err(CoreError::DateConstraintViolation(format!(
            "deadline day {day} is not valid for month {month} (max {max_day})"
        )));
    }
    Ok(())
}

/// A requirement cannot target a year the program does not have.
pub fn validate_target_year(target_year: i32, duration_years: i32) -> Result<(), CoreError> {
    if target_year > duration_years {
        return Err(CoreError::DurationExceeded {
            target_year,
            duration_years,
        });
    }
    Ok(())
}

/// `effective_from_year` must not come after `effective_until_year`.
pub fn validate_effective_range(from: Option<i32>, until: Option<i32>) -> Result<(), CoreError> {
    if let (Some(from), Some(until)) = (from, until) {
        if from > until {
            return Err(CoreError::DateConstraintViolation(format!(
                "effective_from_year {from} is after effective_until_year {until}"
            )));
        }
    }
    Ok(())
}

/// `effective_from_year` must not precede the earliest known academic year.
pub fn validate_effective_from(
    from: Option<i32>,
    earliest_academic_year: Option<i32>,
) -> Result<(), CoreError> {
    if let (Some(from), Some(earliest)) = (from, earliest_academic_year) {
        if from < earliest {
            return Err(CoreError::DateConstraintViolation(format!(
                "effective_from_year {from} precedes the earliest academic year {earliest}"
            )));
        }
    }
    Ok(())
}

/// Whether a requirement applies to the cohort that entered in `cohort_year`.
pub fn is_effective_for(cohort_year: i32, from: Option<i32>, until: Option<i32>) -> bool {
    from.map_or(true, |from| cohort_year >= from)
        && until.map_or(true, |until| cohort_year <= until)
}

// ---------------------------------------------------------------------------
// Effective-until rule
// ---------------------------------------------------------------------------

/// How an updated `effective_until_year` is compared against the latest
/// academic year that already has a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UntilYearRule {
    /// Reject an until-year earlier than the latest scheduled year, so
    /// existing schedules never fall outside the effective range.
    #[default]
    NotBeforeLatestSchedule,
    /// Reject an until-year later than the latest scheduled year.
    NotAfterLatestSchedule,
}

impl UntilYearRule {
    /// Parse the configuration value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "not_before_latest_schedule" => Some(Self::NotBeforeLatestSchedule),
            "not_after_latest_schedule" => Some(Self::NotAfterLatestSchedule),
            _ => None,
        }
    }

    /// Check `until` against the latest scheduled academic year code.
    pub fn check(self, until: Option<i32>, latest_scheduled: Option<i32>) -> Result<(), CoreError> {
        let (Some(until), Some(latest)) = (until, latest_scheduled) else {
            return Ok(());
        };
        match self {
            Self::NotBeforeLatestSchedule if until < latest => {
                Err(CoreError::DateConstraintViolation(format!(
                    "effective_until_year {until} is earlier than the latest scheduled year {latest}"
                )))
            }
            Self::NotAfterLatestSchedule if until > latest => {
                Err(CoreError::DateConstraintViolation(format!(
                    "effective_until_year {until} is later than the latest scheduled year {latest}"
                )))
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// The `effective_until_year` a requirement keeps after being archived.
///
/// Clamped down to the latest scheduled year; never moved upward.
pub fn archived_until_year(current: Option<i32>, latest_scheduled: Option<i32>) -> Option<i32> {
    match (current, latest_scheduled) {
        (None, latest) => latest,
        (Some(until), Some(latest)) if until > latest => Some(latest),
        (current, _) => current,
    }
}

// ---------------------------------------------------------------------------
// Combined shape
// ---------------------------------------------------------------------------

/// The date-related fields of a requirement after defaults and partial
/// updates have been merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequirementShape {
    pub target_year: i32,
    pub deadline_day: i32,
    pub deadline_month: i32,
    pub effective_from_year: Option<i32>,
    pub effective_until_year: Option<i32>,
}

impl RequirementShape {
    /// Run every create-time check against the owning program's duration.
    pub fn validate(&self, duration_years: i32) -> Result<(), CoreError> {
        validate_target_year(self.target_year, duration_years)?;
        validate_deadline(self.deadline_day, self.deadline_month)?;
        validate_effective_range(self.effective_from_year, self.effective_until_year)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
