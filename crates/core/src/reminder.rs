//! Deadline reminder cadence.
//!
//! The daily notifier asks [`decide`] whether a schedule's students should
//! hear about it today and with what tone. Reminders thin out far from the
//! deadline and tighten close to it:
//!
//! | Days to deadline | Kind    | Minimum gap |
//! |------------------|---------|-------------|
//! | > 90             | none    |             |
//! | 30..=90          | remind  | 30 days     |
//! | 7..30            | remind  | 7 days      |
//! | 1..7             | warn    | 2 days      |
//! | 0                | warn    | once today  |
//! | < 0, in grace    | late    | 3 days      |
//! | grace end -7..0  | overdue | 3 days      |

use chrono::TimeDelta;

use crate::academic_calendar::{floor_days, local_date};
use crate::types::Timestamp;

/// Schedules stay eligible this many days after their grace period ends.
pub const OVERDUE_TAIL_DAYS: i64 = 7;

/// Reminders are not sent earlier than this many days before the deadline.
pub const MAX_REMINDER_HORIZON_DAYS: i64 = 90;

/// Tone of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    Remind,
    Warn,
    Late,
    Overdue,
}

impl ReminderKind {
    /// Notification type code persisted on the notification row.
    pub fn notification_code(self) -> &'static str {
        match self {
            Self::Remind => "program_requirement_schedule_remind",
            Self::Warn => "program_requirement_schedule_warn",
            Self::Late => "program_requirement_schedule_late",
            Self::Overdue => "program_requirement_schedule_overdue",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remind => "remind",
            Self::Warn => "warn",
            Self::Late => "late",
            Self::Overdue => "overdue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "remind" => Some(Self::Remind),
            "warn" => Some(Self::Warn),
            "late" => Some(Self::Late),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }
}

/// Whether a schedule is in the notifier's daily scan at `now`.
pub fn is_eligible(
    start_notify_at: Timestamp,
    grace_period_deadline: Timestamp,
    now: Timestamp,
) -> bool {
    start_notify_at <= now && now <= grace_period_deadline + TimeDelta::days(OVERDUE_TAIL_DAYS)
}

/// When the previous reminder went out, relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastNotice {
    /// Whole days elapsed, rounded down.
    pub days_since: i64,
    /// Sent on the current local calendar day.
    pub same_day: bool,
}

impl LastNotice {
    pub fn between(last: Timestamp, now: Timestamp) -> Self {
        Self {
            days_since: floor_days(last, now),
            same_day: local_date(last) == local_date(now),
        }
    }
}

/// Pick the reminder to send, if any.
///
/// `days_until_deadline` and `days_until_grace_end` are whole days rounded
/// down; `last` is `None` when the schedule was never notified.
pub fn decide(
    days_until_deadline: i64,
    days_until_grace_end: i64,
    last: Option<LastNotice>,
) -> Option<ReminderKind> {
    let gap_at_least = |days: i64| last.map_or(true, |l| l.days_since >= days);

    let (kind, due) = match days_until_deadline {
        d if d > MAX_REMINDER_HORIZON_DAYS => return None,
        30..=90 => (ReminderKind::Remind, gap_at_least(30)),
        7..=29 => (ReminderKind::Remind, gap_at_least(7)),
        1..=6 => (ReminderKind::Warn, gap_at_least(2)),
        0 => (ReminderKind::Warn, last.map_or(true, |l| !l.same_day)),
        _ if days_until_grace_end >= 0 => (ReminderKind::Late, gap_at_least(3)),
        _ if days_until_grace_end >= -OVERDUE_TAIL_DAYS => {
            (ReminderKind::Overdue, gap_at_least(3))
        }
        _ => return None,
    };
    due.then_some(kind)
}

/// [`decide`] from raw instants.
pub fn decide_at(
    submission_deadline: Timestamp,
    grace_period_deadline: Timestamp,
    last_notified_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<ReminderKind> {
    decide(
        floor_days(now, submission_deadline),
        floor_days(now, grace_period_deadline),
        last_notified_at.map(|last| LastNotice::between(last, now)),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ago(days_since: i64) -> Option<LastNotice> {
        Some(LastNotice {
            days_since,
            same_day: days_since == 0,
        })
    }

    #[test]
    fn far_from_deadline_is_silent() {
        assert_eq!(decide(91, 98, None), None);
        assert_eq!(decide(365, 372, None), None);
    }

    #[test]
    fn monthly_then_weekly_reminders() {
        assert_eq!(decide(90, 97, None), Some(ReminderKind::Remind));
        assert_eq!(decide(60, 67, ago(29)), None);
        assert_eq!(decide(60, 67, ago(30)), Some(ReminderKind::Remind));
        assert_eq!(decide(20, 27, ago(6)), None);
        assert_eq!(decide(20, 27, ago(7)), Some(ReminderKind::Remind));
    }

    #[test]
    fn final_week_warns_every_other_day() {
        assert_eq!(decide(6, 13, None), Some(ReminderKind::Warn));
        assert_eq!(decide(5, 12, ago(1)), None);
        assert_eq!(decide(4, 11, ago(2)), Some(ReminderKind::Warn));
    }

    #[test]
    fn deadline_day_warns_once() {
        assert_eq!(decide(0, 7, ago(1)), Some(ReminderKind::Warn));
        assert_eq!(decide(0, 7, ago(0)), None);
        assert_eq!(decide(0, 7, None), Some(ReminderKind::Warn));
    }

    #[test]
    fn grace_period_is_late_then_overdue() {
        assert_eq!(decide(-1, 6, None), Some(ReminderKind::Late));
        assert_eq!(decide(-2, 5, ago(2)), None);
        assert_eq!(decide(-3, 4, ago(3)), Some(ReminderKind::Late));
        assert_eq!(decide(-8, -1, ago(3)), Some(ReminderKind::Overdue));
        assert_eq!(decide(-14, -7, None), Some(ReminderKind::Overdue));
        assert_eq!(decide(-15, -8, None), None);
    }

    #[test]
    fn eligibility_window() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let grace = Utc.with_ymd_and_hms(2025, 4, 7, 0, 0, 0).unwrap();
        assert!(!is_eligible(start, grace, start - TimeDelta::seconds(1)));
        assert!(is_eligible(start, grace, start));
        assert!(is_eligible(start, grace, grace + TimeDelta::days(7)));
        assert!(!is_eligible(start, grace, grace + TimeDelta::days(8)));
    }

    #[test]
    fn decide_at_uses_floored_days() {
        let deadline = Utc.with_ymd_and_hms(2025, 3, 15, 16, 59, 59).unwrap();
        let grace = deadline + TimeDelta::days(7);
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 8, 0, 0).unwrap();
        assert_eq!(decide_at(deadline, grace, None, now), Some(ReminderKind::Warn));
        let last = now - TimeDelta::hours(3);
        assert_eq!(decide_at(deadline, grace, Some(last), now), None);
    }

    #[test]
    fn deadline_day_warning_counts_local_calendar_days() {
        let deadline = Utc.with_ymd_and_hms(2025, 3, 15, 16, 59, 59).unwrap();
        let grace = deadline + TimeDelta::days(7);
        // 01:00 on March 15 in Bangkok.
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 18, 0, 0).unwrap();
        // 02:00 on March 14 in Bangkok: under 24 hours ago, but yesterday.
        let yesterday = now - TimeDelta::hours(23);
        assert_eq!(
            decide_at(deadline, grace, Some(yesterday), now),
            Some(ReminderKind::Warn)
        );

        let earlier_today = now - TimeDelta::minutes(30);
        assert_eq!(decide_at(deadline, grace, Some(earlier_today), now), None);
    }

    #[test]
    fn last_notice_between() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 18, 0, 0).unwrap();
        let notice = LastNotice::between(now - TimeDelta::hours(23), now);
        assert_eq!(notice.days_since, 0);
        assert!(!notice.same_day);
        assert!(LastNotice::between(now, now).same_day);
    }

    #[test]
    fn codes_and_names() {
        for kind in [
            ReminderKind::Remind,
            ReminderKind::Warn,
            ReminderKind::Late,
            ReminderKind::Overdue,
        ] {
            assert_eq!(ReminderKind::parse(kind.as_str()), Some(kind));
            assert!(kind.notification_code().ends_with(kind.as_str()));
        }
    }
}
