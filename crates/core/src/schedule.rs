//! Schedule derivation.
//!
//! Turns a requirement's lead times plus a concrete submission deadline into
//! the three instants stored on a schedule, and checks that the deadline
//! lies inside the owning academic year stretched over the program duration.

use chrono::TimeDelta;

use crate::academic_calendar::WindowArithmetic;
use crate::error::CoreError;
use crate::types::Timestamp;

/// Upper bound for grace and notification overrides, in days.
pub const MAX_LEAD_DAYS: i32 = 365;

/// Grace period and notification lead time in effect for one schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadTimes {
    pub grace_period_days: i32,
    pub notification_days: i32,
}

impl LeadTimes {
    /// Pick each override when given, else the requirement default.
    pub fn resolve(
        grace_override: Option<i32>,
        notification_override: Option<i32>,
        default_grace_days: i32,
        default_notification_days: i32,
    ) -> Result<Self, CoreError> {
        let lead = Self {
            grace_period_days: grace_override.unwrap_or(default_grace_days),
            notification_days: notification_override.unwrap_or(default_notification_days),
        };
        for (field, days) in [
            ("grace_period_days", lead.grace_period_days),
            ("notification_days_before_deadline", lead.notification_days),
        ] {
            if !(0..=MAX_LEAD_DAYS).contains(&days) {
                return Err(CoreError::Validation(format!(
                    "{field} must be between 0 and {MAX_LEAD_DAYS}, got {days}"
                )));
            }
        }
        Ok(lead)
    }
}

/// The instants persisted on a schedule row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedDeadlines {
    pub submission_deadline: Timestamp,
    pub grace_period_deadline: Timestamp,
    pub start_notify_at: Timestamp,
}

impl DerivedDeadlines {
    /// `grace = deadline + grace days`, `notify = deadline - notification days`.
    pub fn derive(submission_deadline: Timestamp, lead: LeadTimes) -> Result<Self, CoreError> {
        let out_of_range =
            || CoreError::DateConstraintViolation("derived deadline is out of range".into());
        let grace_period_deadline = submission_deadline
            .checked_add_signed(TimeDelta::days(lead.grace_period_days.into()))
            .ok_or_else(out_of_range)?;
        let start_notify_at = submission_deadline
            .checked_sub_signed(TimeDelta::days(lead.notification_days.into()))
            .ok_or_else(out_of_range)?;
        Ok(Self {
            submission_deadline,
            grace_period_deadline,
            start_notify_at,
        })
    }
}

/// Reject deadlines outside `[start, start + duration]`, both ends inclusive.
pub fn check_deadline_window(
    deadline: Timestamp,
    academic_year_start: Timestamp,
    duration_years: i32,
    arithmetic: WindowArithmetic,
) -> Result<(), CoreError> {
    let window_end = arithmetic.window_end(academic_year_start, duration_years)?;
    if deadline < academic_year_start || deadline > window_end {
        return Err(CoreError::OutOfWindow {
            deadline,
            window_start: academic_year_start,
            window_end,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn overrides_take_precedence() {
        let lead = LeadTimes::resolve(Some(14), None, 7, 90).unwrap();
        assert_eq!(lead.grace_period_days, 14);
        assert_eq!(lead.notification_days, 90);

        let lead = LeadTimes::resolve(None, Some(0), 7, 90).unwrap();
        assert_eq!(lead.grace_period_days, 7);
        assert_eq!(lead.notification_days, 0);
    }

    #[test]
    fn negative_or_huge_lead_times_rejected() {
        assert_matches!(
            LeadTimes::resolve(Some(-1), None, 7, 90),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            LeadTimes::resolve(None, Some(400), 7, 90),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn derived_offsets_match_lead_times() {
        let deadline = date(2025, 3, 15);
        for (grace, notify) in [(0, 0), (7, 90), (30, 1), (365, 365)] {
            let lead = LeadTimes::resolve(Some(grace), Some(notify), 7, 90).unwrap();
            let derived = DerivedDeadlines::derive(deadline, lead).unwrap();
            assert_eq!(derived.submission_deadline, deadline);
            assert_eq!(
                (derived.grace_period_deadline - deadline).num_days(),
                i64::from(grace)
            );
            assert_eq!(
                (deadline - derived.start_notify_at).num_days(),
                i64::from(notify)
            );
        }
    }

    #[test]
    fn four_year_window_from_june_start() {
        let start = date(2024, 6, 1);
        assert!(
            check_deadline_window(date(2028, 5, 30), start, 4, WindowArithmetic::FixedDays)
                .is_ok()
        );
        assert_matches!(
            check_deadline_window(date(2028, 6, 2), start, 4, WindowArithmetic::FixedDays),
            Err(CoreError::OutOfWindow { .. })
        );
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = date(2024, 8, 1);
        let end = WindowArithmetic::FixedDays.window_end(start, 1).unwrap();
        assert!(check_deadline_window(start, start, 1, WindowArithmetic::FixedDays).is_ok());
        assert!(check_deadline_window(end, start, 1, WindowArithmetic::FixedDays).is_ok());
        assert!(check_deadline_window(
            start - TimeDelta::seconds(1),
            start,
            1,
            WindowArithmetic::FixedDays
        )
        .is_err());
    }

    #[test]
    fn calendar_window_accepts_leap_shifted_day() {
        let start = date(2024, 6, 1);
        // 2028-06-01 is one day past the fixed-day window but inside the calendar one.
        let deadline = date(2028, 6, 1);
        assert!(check_deadline_window(deadline, start, 4, WindowArithmetic::FixedDays).is_err());
        assert!(check_deadline_window(deadline, start, 4, WindowArithmetic::Calendar).is_ok());
    }
}
