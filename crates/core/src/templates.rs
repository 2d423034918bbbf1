//! Notification message templates.
//!
//! Each notification topic has a subject and body per channel. Bodies use
//! `{placeholder}` markers filled from [`ScheduleMessage::values`]; unknown
//! placeholders are left untouched so a typo shows up in the message rather
//! than silently disappearing.

use crate::academic_calendar::{floor_days, local_date};
use crate::channels::CHANNEL_LINE;
use crate::reminder::ReminderKind;
use crate::types::Timestamp;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTopic {
    ScheduleCreated,
    ScheduleUpdated,
    Reminder(ReminderKind),
}

impl NotificationTopic {
    /// Notification type code persisted on the notification row.
    pub fn code(self) -> &'static str {
        match self {
            Self::ScheduleCreated => "program_requirement_schedule_create",
            Self::ScheduleUpdated => "program_requirement_schedule_update",
            Self::Reminder(kind) => kind.notification_code(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTemplate {
    pub subject: &'static str,
    pub body: &'static str,
}

/// Template for `topic` on `channel`. LINE messages are shorter plain text.
pub fn template_for(topic: NotificationTopic, channel: &str) -> MessageTemplate {
    let line = channel == CHANNEL_LINE;
    match (topic, line) {
        (NotificationTopic::ScheduleCreated, false) => MessageTemplate {
            subject: "New certificate requirement: {requirement_name}",
            body: "{requirement_name} ({mandatory_flag}) for {program_name} ({program_code}), \
                   academic year {academic_year}, is due on {deadline_date}.",
        },
        (NotificationTopic::ScheduleCreated, true) => MessageTemplate {
            subject: "New requirement",
            body: "{requirement_name} is due on {deadline_date} ({days_remaining} days left).",
        },
        (NotificationTopic::ScheduleUpdated, false) => MessageTemplate {
            subject: "Requirement updated: {requirement_name}",
            body: "The deadline for {requirement_name} ({program_code}, academic year \
                   {academic_year}) is now {deadline_date}.",
        },
        (NotificationTopic::ScheduleUpdated, true) => MessageTemplate {
            subject: "Deadline changed",
            body: "{requirement_name} is now due on {deadline_date}.",
        },
        (NotificationTopic::Reminder(ReminderKind::Remind), false) => MessageTemplate {
            subject: "Reminder: {requirement_name}",
            body: "{requirement_name} ({mandatory_flag}) is due on {deadline_date}. \
                   {days_remaining} days remaining.",
        },
        (NotificationTopic::Reminder(ReminderKind::Remind), true) => MessageTemplate {
            subject: "Reminder",
            body: "{requirement_name}: {days_remaining} days left (due {deadline_date}).",
        },
        (NotificationTopic::Reminder(ReminderKind::Warn), false) => MessageTemplate {
            subject: "Deadline approaching: {requirement_name}",
            body: "Only {days_remaining} days remain to submit {requirement_name} \
                   (due {deadline_date}).",
        },
        (NotificationTopic::Reminder(ReminderKind::Warn), true) => MessageTemplate {
            subject: "Deadline approaching",
            body: "{requirement_name} is due on {deadline_date}. Please submit soon.",
        },
        (NotificationTopic::Reminder(ReminderKind::Late), false) => MessageTemplate {
            subject: "Deadline passed: {requirement_name}",
            body: "The deadline for {requirement_name} was {deadline_date}, \
                   {days_overdue} days ago. Submissions are still accepted during the grace \
                   period.",
        },
        (NotificationTopic::Reminder(ReminderKind::Late), true) => MessageTemplate {
            subject: "Deadline passed",
            body: "{requirement_name} was due {days_overdue} days ago. Grace period still open.",
        },
        (NotificationTopic::Reminder(ReminderKind::Overdue), false) => MessageTemplate {
            subject: "Overdue: {requirement_name}",
            body: "{requirement_name} for {program_name} is overdue by {days_overdue} days. \
                   Please contact program staff.",
        },
        (NotificationTopic::Reminder(ReminderKind::Overdue), true) => MessageTemplate {
            subject: "Overdue",
            body: "{requirement_name} is overdue by {days_overdue} days.",
        },
    }
}

/// Replace every `{key}` in `template` with its value.
pub fn render(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match values.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Data describing one schedule, from which placeholder values are built.
#[derive(Debug, Clone)]
pub struct ScheduleMessage {
    pub requirement_name: String,
    pub program_name: String,
    pub program_code: String,
    pub academic_year: i32,
    pub submission_deadline: Timestamp,
    pub is_mandatory: bool,
}

impl ScheduleMessage {
    /// Placeholder values as of `now`.
    pub fn values(&self, now: Timestamp) -> Vec<(&'static str, String)> {
        let days = floor_days(now, self.submission_deadline);
        vec![
            ("requirement_name", self.requirement_name.clone()),
            ("program_name", self.program_name.clone()),
            ("program_code", self.program_code.clone()),
            ("academic_year", self.academic_year.to_string()),
            (
                "deadline_date",
                local_date(self.submission_deadline)
                    .format("%Y-%m-%d")
                    .to_string(),
            ),
            ("days_remaining", days.max(0).to_string()),
            ("days_overdue", (-days).max(0).to_string()),
            (
                "mandatory_flag",
                if self.is_mandatory { "mandatory" } else { "optional" }.to_string(),
            ),
        ]
    }

    /// Rendered `(subject, body)` for `topic` on `channel`.
    pub fn render(
        &self,
        topic: NotificationTopic,
        channel: &str,
        now: Timestamp,
    ) -> (String, String) {
        let template = template_for(topic, channel);
        let values = self.values(now);
        (render(template.subject, &values), render(template.body, &values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::CHANNEL_IN_APP;
    use chrono::{TimeZone, Utc};

    fn message() -> ScheduleMessage {
        ScheduleMessage {
            requirement_name: "First aid certificate".into(),
            program_name: "Nursing".into(),
            program_code: "NUR".into(),
            academic_year: 2024,
            submission_deadline: Utc.with_ymd_and_hms(2025, 3, 15, 16, 59, 59).unwrap(),
            is_mandatory: true,
        }
    }

    #[test]
    fn render_fills_known_and_keeps_unknown() {
        let values = vec![("name", "Ann".to_string())];
        assert_eq!(render("Hi {name}, {missing}!", &values), "Hi Ann, {missing}!");
        assert_eq!(render("no braces", &values), "no braces");
        assert_eq!(render("dangling {name", &values), "dangling {name");
    }

    #[test]
    fn values_use_local_deadline_date() {
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap();
        let values = message().values(now);
        let get = |key: &str| values.iter().find(|(k, _)| *k == key).unwrap().1.clone();
        assert_eq!(get("deadline_date"), "2025-03-15");
        assert_eq!(get("days_remaining"), "10");
        assert_eq!(get("days_overdue"), "0");
        assert_eq!(get("mandatory_flag"), "mandatory");
    }

    #[test]
    fn overdue_message_counts_days_past() {
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap();
        let (subject, body) = message().render(
            NotificationTopic::Reminder(ReminderKind::Late),
            CHANNEL_LINE,
            now,
        );
        assert_eq!(subject, "Deadline passed");
        assert_eq!(
            body,
            "First aid certificate was due 5 days ago. Grace period still open."
        );
    }

    #[test]
    fn in_app_templates_have_no_leftover_placeholders() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let topics = [
            NotificationTopic::ScheduleCreated,
            NotificationTopic::ScheduleUpdated,
            NotificationTopic::Reminder(ReminderKind::Remind),
            NotificationTopic::Reminder(ReminderKind::Warn),
            NotificationTopic::Reminder(ReminderKind::Late),
            NotificationTopic::Reminder(ReminderKind::Overdue),
        ];
        for topic in topics {
            for channel in [CHANNEL_IN_APP, CHANNEL_LINE] {
                let (subject, body) = message().render(topic, channel, now);
                assert!(!subject.contains('{') && !body.contains('{'), "{topic:?} {channel}");
            }
        }
    }

    #[test]
    fn topic_codes() {
        assert_eq!(
            NotificationTopic::ScheduleCreated.code(),
            "program_requirement_schedule_create"
        );
        assert_eq!(
            NotificationTopic::Reminder(ReminderKind::Overdue).code(),
            "program_requirement_schedule_overdue"
        );
    }
}
