//! Daily deadline notifier.
//!
//! Scans schedules inside their reminder window, asks the cadence rules
//! whether each one is due a reminder today, and publishes a
//! `schedule.reminder` event for those that are. The notification router
//! turns the event into student notifications. `last_notified_at` is stamped
//! once the event is out.

use std::sync::Arc;
use std::time::Duration;

use certtrack_core::context::RequestContext;
use certtrack_core::reminder::{decide_at, ReminderKind};
use certtrack_core::transport::TransportValue;
use certtrack_core::types::Timestamp;
use certtrack_db::models::schedule::Schedule;
use certtrack_db::repositories::ScheduleRepo;
use certtrack_db::DbPool;
use certtrack_events::bus::{entity_types, event_types, DomainEvent};
use certtrack_events::EventBus;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

pub const JOB_NAME: &str = "deadline-notifier";

/// Outcome counts of one notifier cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierReport {
    pub scanned: u32,
    pub reminded: u32,
    pub failed: u32,
}

/// Run the notifier loop until `cancel` is triggered.
pub async fn run(pool: DbPool, events: Arc<EventBus>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Deadline notifier started");
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Deadline notifier stopping");
                break;
            }
            _ = interval.tick() => {
                match notify_cycle(&pool, &events, Utc::now()).await {
                    Ok(report) => tracing::info!(
                        scanned = report.scanned,
                        reminded = report.reminded,
                        failed = report.failed,
                        "Deadline notifier cycle finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "Deadline notifier cycle failed"),
                }
            }
        }
    }
}

/// One notifier pass at `now`.
pub async fn notify_cycle(
    pool: &DbPool,
    events: &EventBus,
    now: Timestamp,
) -> Result<NotifierReport, sqlx::Error> {
    let schedules = ScheduleRepo::list_notifiable(pool, now).await?;
    let ctx = RequestContext::scheduled(JOB_NAME);
    let mut report = NotifierReport::default();

    for schedule in &schedules {
        report.scanned += 1;
        let Some(kind) = due_reminder(schedule, now) else {
            continue;
        };

        events.publish(reminder_event(schedule, kind, &ctx));
        match ScheduleRepo::mark_notified(pool, schedule.id, now).await {
            Ok(()) => {
                tracing::debug!(
                    schedule_id = %schedule.id,
                    kind = kind.as_str(),
                    "Reminder published"
                );
                report.reminded += 1;
            }
            Err(e) => {
                tracing::error!(
                    schedule_id = %schedule.id,
                    error = %e,
                    "Failed to stamp last_notified_at"
                );
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// The reminder `schedule` is due at `now`, if any.
pub fn due_reminder(schedule: &Schedule, now: Timestamp) -> Option<ReminderKind> {
    decide_at(
        schedule.submission_deadline,
        schedule.grace_period_deadline,
        schedule.last_notified_at,
        now,
    )
}

pub fn reminder_event(
    schedule: &Schedule,
    kind: ReminderKind,
    ctx: &RequestContext,
) -> DomainEvent {
    DomainEvent::new(event_types::SCHEDULE_REMINDER)
        .with_source(entity_types::SCHEDULE, schedule.id)
        .with_context(ctx)
        .with_payload(
            TransportValue::map()
                .field("schedule_id", schedule.id)
                .field("kind", TransportValue::Enum(kind.as_str()))
                .field("submission_deadline", schedule.submission_deadline)
                .field("grace_period_deadline", schedule.grace_period_deadline)
                .to_json(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use uuid::Uuid;

    fn schedule(deadline: Timestamp, last_notified_at: Option<Timestamp>) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            program_requirement_id: Uuid::new_v4(),
            academic_year_id: Uuid::new_v4(),
            submission_deadline: deadline,
            grace_period_deadline: deadline + TimeDelta::days(7),
            start_notify_at: deadline - TimeDelta::days(90),
            last_notified_at,
            created_at: deadline - TimeDelta::days(120),
            updated_at: deadline - TimeDelta::days(120),
        }
    }

    #[test]
    fn reminder_follows_cadence() {
        let deadline = Utc.with_ymd_and_hms(2025, 3, 15, 16, 59, 59).unwrap();
        let now = deadline - TimeDelta::days(20);

        assert_eq!(due_reminder(&schedule(deadline, None), now), Some(ReminderKind::Remind));
        let recent = Some(now - TimeDelta::days(3));
        assert_eq!(due_reminder(&schedule(deadline, recent), now), None);
    }

    #[test]
    fn event_carries_kind_for_the_router() {
        let deadline = Utc.with_ymd_and_hms(2025, 3, 15, 16, 59, 59).unwrap();
        let s = schedule(deadline, None);
        let ctx = RequestContext::scheduled(JOB_NAME);

        let event = reminder_event(&s, ReminderKind::Late, &ctx);

        assert_eq!(event.event_type, event_types::SCHEDULE_REMINDER);
        assert_eq!(event.source_entity_id, Some(s.id));
        assert_eq!(event.payload["kind"], "late");
        assert_eq!(
            certtrack_events::router::topic_for(&event),
            Some(certtrack_core::templates::NotificationTopic::Reminder(ReminderKind::Late))
        );
    }
}
