//! Periodic schedule planning.
//!
//! Decides, for one requirement at one instant, whether the monthly planner
//! should create the next schedule and with which deadline. The planner job
//! loads the rows; this module only looks at them.

use chrono::{Datelike, Months, NaiveDate, NaiveTime};

use crate::academic_calendar::{
    calendar_year_for_month, local_date, local_end_of_day, ACADEMIC_YEAR_START_MONTH,
};
use crate::requirement::is_effective_for;
use crate::types::Timestamp;

/// A schedule is created at most this many days before its creation date.
pub const CREATION_WINDOW_DAYS: i64 = 30;

/// The requirement fields the planner reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringRequirement {
    pub target_year: i32,
    pub deadline_day: i32,
    pub deadline_month: i32,
    pub months_before_deadline: Option<i32>,
    pub effective_from_year: Option<i32>,
    pub effective_until_year: Option<i32>,
    pub is_one_off: bool,
    pub last_recurrence_at: Option<Timestamp>,
}

/// A schedule the planner should create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSchedule {
    /// Academic year code of the cohort the schedule belongs to.
    pub cohort_year: i32,
    pub submission_deadline: Timestamp,
    /// Deadline minus `months_before_deadline`.
    pub creation_date: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoLeadMonths,
    NotEffective,
    AlreadyScheduled,
    AlreadyRecurred,
    OneOffDone,
    InvalidDeadline,
    OutsideCreationWindow { days_until_creation: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanDecision {
    Create(PlannedSchedule),
    Skip(SkipReason),
}

/// Entry year of the cohort that is in `target_year` during `current_year`.
pub fn cohort_year(current_year: i32, target_year: i32) -> i32 {
    current_year - target_year + 1
}

/// Local 23:59:59 on `month`/`day` during `academic_year`, as UTC.
pub fn deadline_in_academic_year(academic_year: i32, month: i32, day: i32) -> Option<Timestamp> {
    let month = u32::try_from(month).ok()?;
    let day = u32::try_from(day).ok()?;
    let date = NaiveDate::from_ymd_opt(calendar_year_for_month(academic_year, month), month, day)?;
    local_end_of_day(date)
}

/// Value stored in `last_recurrence_at` once a cohort has been scheduled.
pub fn recurrence_marker(cohort_year: i32) -> Option<Timestamp> {
    NaiveDate::from_ymd_opt(cohort_year, ACADEMIC_YEAR_START_MONTH, 1)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Decide what to do for `requirement` at `now`.
///
/// `current_year` is the academic year in effect at `now`;
/// `scheduled_years` holds the academic year codes that already have a
/// schedule for this requirement.
pub fn plan(
    requirement: &RecurringRequirement,
    current_year: i32,
    scheduled_years: &[i32],
    now: Timestamp,
) -> PlanDecision {
    let Some(lead_months) = requirement
        .months_before_deadline
        .and_then(|m| u32::try_from(m).ok())
        .filter(|m| *m > 0)
    else {
        return PlanDecision::Skip(SkipReason::NoLeadMonths);
    };

    let cohort = cohort_year(current_year, requirement.target_year);
    if !is_effective_for(
        cohort,
        requirement.effective_from_year,
        requirement.effective_until_year,
    ) {
        return PlanDecision::Skip(SkipReason::NotEffective);
    }
    if requirement.is_one_off && !scheduled_years.is_empty() {
        return PlanDecision::Skip(SkipReason::OneOffDone);
    }
    if scheduled_years.contains(&cohort) {
        return PlanDecision::Skip(SkipReason::AlreadyScheduled);
    }
    if requirement
        .last_recurrence_at
        .is_some_and(|at| local_date(at).year() == cohort)
    {
        return PlanDecision::Skip(SkipReason::AlreadyRecurred);
    }

    let deadline_year = cohort + requirement.target_year - 1;
    let Some(submission_deadline) = deadline_in_academic_year(
        deadline_year,
        requirement.deadline_month,
        requirement.deadline_day,
    ) else {
        return PlanDecision::Skip(SkipReason::InvalidDeadline);
    };
    let Some(creation_date) = submission_deadline.checked_sub_months(Months::new(lead_months))
    else {
        return PlanDecision::Skip(SkipReason::InvalidDeadline);
    };

    let days_until_creation = (local_date(creation_date) - local_date(now)).num_days();
    if !(0..=CREATION_WINDOW_DAYS).contains(&days_until_creation) {
        return PlanDecision::Skip(SkipReason::OutsideCreationWindow {
            days_until_creation,
        });
    }

    PlanDecision::Create(PlannedSchedule {
        cohort_year: cohort,
        submission_deadline,
        creation_date,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn requirement() -> RecurringRequirement {
        RecurringRequirement {
            target_year: 2,
            deadline_day: 15,
            deadline_month: 3,
            months_before_deadline: Some(2),
            effective_from_year: None,
            effective_until_year: None,
            is_one_off: false,
            last_recurrence_at: None,
        }
    }

    #[test]
    fn cohort_counts_back_from_target_year() {
        assert_eq!(cohort_year(2025, 1), 2025);
        assert_eq!(cohort_year(2025, 4), 2022);
    }

    #[test]
    fn spring_deadline_lands_in_following_calendar_year() {
        let deadline = deadline_in_academic_year(2025, 3, 15).unwrap();
        assert_eq!(deadline, Utc.with_ymd_and_hms(2026, 3, 15, 16, 59, 59).unwrap());
        let autumn = deadline_in_academic_year(2025, 10, 1).unwrap();
        assert_eq!(autumn, Utc.with_ymd_and_hms(2025, 10, 1, 16, 59, 59).unwrap());
    }

    #[test]
    fn creates_when_creation_date_is_near() {
        // AY 2025, target year 2 -> cohort 2024, deadline 2026-03-15, created from 2026-01-15.
        let now = utc(2026, 1, 1, 3);
        let decision = plan(&requirement(), 2025, &[], now);
        let PlanDecision::Create(planned) = decision else {
            panic!("expected Create, got {decision:?}");
        };
        assert_eq!(planned.cohort_year, 2024);
        assert_eq!(
            planned.submission_deadline,
            Utc.with_ymd_and_hms(2026, 3, 15, 16, 59, 59).unwrap()
        );
        assert_eq!(
            planned.creation_date,
            Utc.with_ymd_and_hms(2026, 1, 15, 16, 59, 59).unwrap()
        );
    }

    #[test]
    fn too_early_or_past_creation_date_skips() {
        let early = plan(&requirement(), 2025, &[], utc(2025, 11, 1, 3));
        assert!(matches!(
            early,
            PlanDecision::Skip(SkipReason::OutsideCreationWindow { days_until_creation })
                if days_until_creation > 30
        ));
        let late = plan(&requirement(), 2025, &[], utc(2026, 2, 1, 3));
        assert!(matches!(
            late,
            PlanDecision::Skip(SkipReason::OutsideCreationWindow { days_until_creation })
                if days_until_creation < 0
        ));
    }

    #[test]
    fn existing_cohort_schedule_skips() {
        let now = utc(2026, 1, 1, 3);
        assert_eq!(
            plan(&requirement(), 2025, &[2023, 2024], now),
            PlanDecision::Skip(SkipReason::AlreadyScheduled)
        );
    }

    #[test]
    fn recurrence_marker_for_cohort_skips() {
        let now = utc(2026, 1, 1, 3);
        let req = RecurringRequirement {
            last_recurrence_at: recurrence_marker(2024),
            ..requirement()
        };
        assert_eq!(
            plan(&req, 2025, &[], now),
            PlanDecision::Skip(SkipReason::AlreadyRecurred)
        );
        let req = RecurringRequirement {
            last_recurrence_at: recurrence_marker(2023),
            ..requirement()
        };
        assert!(matches!(plan(&req, 2025, &[], now), PlanDecision::Create(_)));
    }

    #[test]
    fn effective_range_and_lead_months_gate_planning() {
        let now = utc(2026, 1, 1, 3);
        let req = RecurringRequirement {
            effective_from_year: Some(2025),
            ..requirement()
        };
        assert_eq!(
            plan(&req, 2025, &[], now),
            PlanDecision::Skip(SkipReason::NotEffective)
        );
        let req = RecurringRequirement {
            months_before_deadline: None,
            ..requirement()
        };
        assert_eq!(
            plan(&req, 2025, &[], now),
            PlanDecision::Skip(SkipReason::NoLeadMonths)
        );
    }

    #[test]
    fn one_off_requirement_is_planned_once() {
        let now = utc(2026, 1, 1, 3);
        let req = RecurringRequirement {
            is_one_off: true,
            ..requirement()
        };
        assert!(matches!(plan(&req, 2025, &[], now), PlanDecision::Create(_)));
        assert_eq!(
            plan(&req, 2025, &[2023], now),
            PlanDecision::Skip(SkipReason::OneOffDone)
        );
    }

    #[test]
    fn invalid_calendar_date_skips() {
        let req = RecurringRequirement {
            deadline_day: 31,
            deadline_month: 4,
            ..requirement()
        };
        assert_eq!(
            plan(&req, 2025, &[], utc(2026, 1, 1, 3)),
            PlanDecision::Skip(SkipReason::InvalidDeadline)
        );
    }

    #[test]
    fn marker_is_august_first_utc() {
        assert_eq!(recurrence_marker(2024), Some(utc(2024, 8, 1, 0)));
    }
}
