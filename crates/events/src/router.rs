//! Event-to-notification routing.
//!
//! [`NotificationRouter`] subscribes to the event bus and, for schedule
//! events, persists one notification addressed to every active student of
//! the schedule's cohort. Recipients with a linked LINE account are pushed
//! in spawned tasks; their outcome is written back to the recipient row.
//! Nothing here can fail the mutation that raised the event.

use std::collections::HashMap;
use std::sync::Arc;

use certtrack_core::channels::{CHANNEL_IN_APP, CHANNEL_LINE};
use certtrack_core::reminder::ReminderKind;
use certtrack_core::templates::NotificationTopic;
use certtrack_core::transport::TransportValue;
use certtrack_core::types::{DbId, Timestamp};
use certtrack_db::models::notification::{NewNotification, NewRecipient};
use certtrack_db::models::schedule::ScheduleContext;
use certtrack_db::models::status::NotificationPriority;
use certtrack_db::models::student::Recipient;
use certtrack_db::repositories::{NotificationRepo, ScheduleRepo, StudentRepo};
use certtrack_db::DbPool;
use chrono::{TimeDelta, Utc};
use tokio::sync::broadcast;

use crate::bus::{entity_types, event_types, DomainEvent};
use crate::delivery::line::LinePushDelivery;

/// Notifications stop showing in the portal this many days after creation.
pub const NOTIFICATION_TTL_DAYS: i64 = 15;

type RouteResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Routes schedule events to student notifications.
pub struct NotificationRouter {
    pool: DbPool,
    line: Option<Arc<LinePushDelivery>>,
}

impl NotificationRouter {
    /// Create a router. With `line = None` only in-app notifications are stored.
    pub fn new(pool: DbPool, line: Option<Arc<LinePushDelivery>>) -> Self {
        Self { pool, line }
    }

    /// Run the routing loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Persist and deliver the notification for a single event.
    async fn route_event(&self, event: &DomainEvent) -> RouteResult {
        let Some(topic) = topic_for(event) else {
            return Ok(());
        };
        let Some(schedule_id) = event.source_entity_id else {
            tracing::warn!(event_type = %event.event_type, "Schedule event without source id");
            return Ok(());
        };

        let Some(context) = ScheduleRepo::find_context(&self.pool, schedule_id).await? else {
            tracing::warn!(%schedule_id, "Schedule not found, skipping notification");
            return Ok(());
        };

        let recipients = StudentRepo::recipients_for_cohort(
            &self.pool,
            context.program_id,
            context.academic_year_id,
        )
        .await?;
        if recipients.is_empty() {
            tracing::debug!(%schedule_id, "No active students in cohort");
            return Ok(());
        }

        let now = Utc::now();
        let notification = build_notification(&context, topic, event, now);
        let new_recipients = address(&recipients, self.line.is_some());
        let (notification, rows) =
            NotificationRepo::create_with_recipients(&self.pool, &notification, &new_recipients)
                .await?;

        tracing::info!(
            notification_id = %notification.id,
            %schedule_id,
            code = %notification.notification_code,
            recipients = rows.len(),
            "Notification stored"
        );

        let Some(line) = &self.line else {
            return Ok(());
        };
        let line_ids: HashMap<DbId, &str> = recipients
            .iter()
            .filter_map(|r| r.line_user_id.as_deref().map(|id| (r.student_id, id)))
            .collect();

        for row in rows.iter().filter(|r| r.line_app_enabled) {
            let Some(line_user_id) = line_ids.get(&row.student_id) else {
                continue;
            };
            spawn_line_push(
                self.pool.clone(),
                Arc::clone(line),
                row.id,
                line_user_id.to_string(),
                notification.line_subject.clone(),
                notification.line_body.clone(),
            );
        }

        Ok(())
    }
}

/// Push one LINE message in the background and record the outcome.
fn spawn_line_push(
    pool: DbPool,
    line: Arc<LinePushDelivery>,
    recipient_id: DbId,
    line_user_id: String,
    subject: String,
    body: String,
) {
    tokio::spawn(async move {
        let outcome = line.push(&line_user_id, &subject, &body).await;
        let recorded = match &outcome {
            Ok(()) => NotificationRepo::mark_line_sent(&pool, recipient_id).await,
            Err(e) => NotificationRepo::mark_line_failed(&pool, recipient_id, &e.to_string()).await,
        };
        if let Err(e) = recorded {
            tracing::error!(%recipient_id, error = %e, "Failed to record LINE push outcome");
        }
    });
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// The notification topic an event maps to, if it notifies students at all.
pub fn topic_for(event: &DomainEvent) -> Option<NotificationTopic> {
    match event.event_type.as_str() {
        event_types::SCHEDULE_CREATED => Some(NotificationTopic::ScheduleCreated),
        event_types::SCHEDULE_UPDATED => Some(NotificationTopic::ScheduleUpdated),
        event_types::SCHEDULE_REMINDER => event
            .payload
            .get("kind")
            .and_then(|k| k.as_str())
            .and_then(ReminderKind::parse)
            .map(NotificationTopic::Reminder),
        _ => None,
    }
}

pub fn priority_for(topic: NotificationTopic) -> NotificationPriority {
    match topic {
        NotificationTopic::ScheduleCreated | NotificationTopic::ScheduleUpdated => {
            NotificationPriority::Medium
        }
        NotificationTopic::Reminder(ReminderKind::Remind) => NotificationPriority::Low,
        NotificationTopic::Reminder(ReminderKind::Warn | ReminderKind::Late) => {
            NotificationPriority::High
        }
        NotificationTopic::Reminder(ReminderKind::Overdue) => NotificationPriority::Urgent,
    }
}

/// Render both channels' messages and assemble the notification row.
pub fn build_notification(
    context: &ScheduleContext,
    topic: NotificationTopic,
    event: &DomainEvent,
    now: Timestamp,
) -> NewNotification {
    let message = context.message();
    let (subject, body) = message.render(topic, CHANNEL_IN_APP, now);
    let (line_subject, line_body) = message.render(topic, CHANNEL_LINE, now);

    let metadata = TransportValue::map()
        .field("schedule_id", context.schedule_id)
        .field("program_requirement_id", context.program_requirement_id)
        .field("program_code", context.program_code.clone())
        .field("academic_year", context.year_code)
        .field("submission_deadline", context.submission_deadline)
        .field("grace_period_deadline", context.grace_period_deadline)
        .field("event_type", event.event_type.clone())
        .to_json();

    let (actor_type, actor_id, request_id) = match &event.context {
        Some(ctx) => (ctx.actor.kind(), ctx.actor.user_id(), Some(ctx.request_id)),
        None => ("system", None, None),
    };

    NewNotification {
        notification_code: topic.code().to_string(),
        entity_type: entity_types::SCHEDULE.to_string(),
        entity_id: context.schedule_id,
        actor_type: actor_type.to_string(),
        actor_id,
        request_id,
        priority_id: priority_for(topic).id(),
        subject,
        body,
        line_subject,
        line_body,
        metadata,
        scheduled_for: None,
        expires_at: Some(now + TimeDelta::days(NOTIFICATION_TTL_DAYS)),
    }
}

/// Recipient rows: in-app for everyone, LINE where a LINE id is linked and
/// LINE delivery is configured.
pub fn address(recipients: &[Recipient], line_enabled: bool) -> Vec<NewRecipient> {
    recipients
        .iter()
        .map(|r| NewRecipient {
            student_id: r.student_id,
            in_app_enabled: true,
            line_app_enabled: line_enabled && r.line_user_id.is_some(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use certtrack_core::context::RequestContext;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn context() -> ScheduleContext {
        ScheduleContext {
            schedule_id: Uuid::new_v4(),
            program_requirement_id: Uuid::new_v4(),
            requirement_name: "CPR certificate".into(),
            is_mandatory: true,
            program_id: Uuid::new_v4(),
            program_code: "NUR".into(),
            program_name: "Nursing".into(),
            academic_year_id: Uuid::new_v4(),
            year_code: 2024,
            submission_deadline: Utc.with_ymd_and_hms(2026, 3, 15, 16, 59, 59).unwrap(),
            grace_period_deadline: Utc.with_ymd_and_hms(2026, 3, 22, 16, 59, 59).unwrap(),
        }
    }

    #[test]
    fn reminder_events_map_by_kind() {
        let event = DomainEvent::new(event_types::SCHEDULE_REMINDER)
            .with_payload(serde_json::json!({"kind": "overdue"}));
        assert_eq!(
            topic_for(&event),
            Some(NotificationTopic::Reminder(ReminderKind::Overdue))
        );

        let missing_kind = DomainEvent::new(event_types::SCHEDULE_REMINDER);
        assert_eq!(topic_for(&missing_kind), None);
    }

    #[test]
    fn requirement_events_do_not_notify_students() {
        assert_eq!(topic_for(&DomainEvent::new(event_types::REQUIREMENT_ARCHIVED)), None);
        assert_eq!(
            topic_for(&DomainEvent::new(event_types::SCHEDULE_CREATED)),
            Some(NotificationTopic::ScheduleCreated)
        );
    }

    #[test]
    fn notification_carries_actor_and_expiry() {
        let ctx = context();
        let request = RequestContext::scheduled("deadline-notifier");
        let event = DomainEvent::new(event_types::SCHEDULE_REMINDER)
            .with_source(entity_types::SCHEDULE, ctx.schedule_id)
            .with_context(&request)
            .with_payload(serde_json::json!({"kind": "warn"}));
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();

        let topic = topic_for(&event).unwrap();
        let n = build_notification(&ctx, topic, &event, now);

        assert_eq!(n.notification_code, "program_requirement_schedule_warn");
        assert_eq!(n.actor_type, "scheduled");
        assert_eq!(n.actor_id, None);
        assert_eq!(n.request_id, Some(request.request_id));
        assert_eq!(n.priority_id, NotificationPriority::High.id());
        assert_eq!(n.expires_at, Some(now + TimeDelta::days(15)));
        assert_eq!(n.entity_id, ctx.schedule_id);
        assert!(n.body.contains("CPR certificate"));
        assert_eq!(n.metadata["programCode"], "NUR");
        assert_eq!(n.metadata["academicYear"], 2024);
        assert_eq!(n.metadata["submissionDeadline"], "2026-03-15T16:59:59Z");
    }

    #[test]
    fn staff_actor_is_recorded() {
        let ctx = context();
        let staff = Uuid::new_v4();
        let event = DomainEvent::new(event_types::SCHEDULE_CREATED)
            .with_context(&RequestContext::for_user(staff));
        let n = build_notification(
            &ctx,
            NotificationTopic::ScheduleCreated,
            &event,
            Utc::now(),
        );
        assert_eq!(n.actor_type, "user");
        assert_eq!(n.actor_id, Some(staff));
    }

    #[test]
    fn line_only_for_linked_students_when_enabled() {
        let recipients = vec![
            Recipient {
                student_id: Uuid::new_v4(),
                line_user_id: Some("U1".into()),
            },
            Recipient {
                student_id: Uuid::new_v4(),
                line_user_id: None,
            },
        ];
        let with_line = address(&recipients, true);
        assert!(with_line.iter().all(|r| r.in_app_enabled));
        assert_eq!(
            with_line.iter().map(|r| r.line_app_enabled).collect::<Vec<_>>(),
            vec![true, false]
        );
        assert!(address(&recipients, false).iter().all(|r| !r.line_app_enabled));
    }

    #[test]
    fn priorities_escalate_with_urgency() {
        assert_eq!(
            priority_for(NotificationTopic::Reminder(ReminderKind::Remind)),
            NotificationPriority::Low
        );
        assert_eq!(
            priority_for(NotificationTopic::Reminder(ReminderKind::Overdue)),
            NotificationPriority::Urgent
        );
    }
}
