//! Repository for the `notifications` and `notification_recipients` tables.

use certtrack_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::notification::{
    InboxItem, NewNotification, NewRecipient, Notification, NotificationRecipient,
};
use crate::models::status::RecipientStatus;

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, notification_code, entity_type, entity_id, actor_type, actor_id, \
    request_id, priority_id, subject, body, line_subject, line_body, metadata, \
    scheduled_for, expires_at, created_at";

/// Column list for `notification_recipients` queries.
const RECIPIENT_COLUMNS: &str = "id, notification_id, student_id, in_app_enabled, \
    line_app_enabled, status_id, delivered_at, read_at, line_app_sent_at, failure_reason, \
    created_at";

/// Provides persistence and delivery tracking for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification and its recipients in one transaction.
    ///
    /// Recipients with in-app enabled are stored as delivered, since the
    /// portal reads them straight from this table. The rest stay pending
    /// until their LINE push completes.
    pub async fn create_with_recipients(
        pool: &PgPool,
        input: &NewNotification,
        recipients: &[NewRecipient],
    ) -> Result<(Notification, Vec<NotificationRecipient>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO notifications \
                (notification_code, entity_type, entity_id, actor_type, actor_id, request_id, \
                 priority_id, subject, body, line_subject, line_body, metadata, \
                 scheduled_for, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {COLUMNS}"
        );
        let notification = sqlx::query_as::<_, Notification>(&query)
            .bind(&input.notification_code)
            .bind(&input.entity_type)
            .bind(input.entity_id)
            .bind(&input.actor_type)
            .bind(input.actor_id)
            .bind(input.request_id)
            .bind(input.priority_id)
            .bind(&input.subject)
            .bind(&input.body)
            .bind(&input.line_subject)
            .bind(&input.line_body)
            .bind(&input.metadata)
            .bind(input.scheduled_for)
            .bind(input.expires_at)
            .fetch_one(&mut *tx)
            .await?;

        let recipient_query = format!(
            "INSERT INTO notification_recipients \
                (notification_id, student_id, in_app_enabled, line_app_enabled, \
                 status_id, delivered_at) \
             VALUES ($1, $2, $3, $4, \
                 CASE WHEN $3 THEN $5 ELSE $6 END, \
                 CASE WHEN $3 THEN NOW() END) \
             RETURNING {RECIPIENT_COLUMNS}"
        );
        let mut rows = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let row = sqlx::query_as::<_, NotificationRecipient>(&recipient_query)
                .bind(notification.id)
                .bind(recipient.student_id)
                .bind(recipient.in_app_enabled)
                .bind(recipient.line_app_enabled)
                .bind(RecipientStatus::Delivered.id())
                .bind(RecipientStatus::Pending.id())
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }

        tx.commit().await?;
        Ok((notification, rows))
    }

    /// Record a successful LINE push for a recipient.
    pub async fn mark_line_sent(pool: &PgPool, recipient_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_recipients SET \
                line_app_sent_at = NOW(), \
                status_id = CASE WHEN status_id = $2 THEN $3 ELSE status_id END, \
                delivered_at = COALESCE(delivered_at, NOW()) \
             WHERE id = $1",
        )
        .bind(recipient_id)
        .bind(RecipientStatus::Pending.id())
        .bind(RecipientStatus::Delivered.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed LINE push. Recipients with nothing else delivered
    /// move to `failed`.
    pub async fn mark_line_failed(
        pool: &PgPool,
        recipient_id: DbId,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_recipients SET \
                failure_reason = $2, \
                status_id = CASE WHEN status_id = $3 THEN $4 ELSE status_id END \
             WHERE id = $1",
        )
        .bind(recipient_id)
        .bind(reason)
        .bind(RecipientStatus::Pending.id())
        .bind(RecipientStatus::Failed.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// In-app notifications for a student, newest first.
    ///
    /// When `unread_only` is `true`, only delivered-but-unread items are returned.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InboxItem>, sqlx::Error> {
        let filter = if unread_only { "AND r.read_at IS NULL" } else { "" };
        let query = format!(
            "SELECT r.id AS recipient_id, n.id AS notification_id, n.notification_code, \
                    n.subject, n.body, n.priority_id, r.status_id, r.read_at, n.created_at \
             FROM notification_recipients r \
             JOIN notifications n ON n.id = r.notification_id \
             WHERE r.student_id = $1 AND r.in_app_enabled = true AND r.status_id <> $2 {filter} \
             ORDER BY n.created_at DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, InboxItem>(&query)
            .bind(student_id)
            .bind(RecipientStatus::Expired.id())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Mark one notification read for a student.
    ///
    /// Returns `true` if the recipient row was found for the student and updated.
    pub async fn mark_read(
        pool: &PgPool,
        recipient_id: DbId,
        student_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification_recipients \
             SET status_id = $3, read_at = NOW() \
             WHERE id = $1 AND student_id = $2 AND read_at IS NULL",
        )
        .bind(recipient_id)
        .bind(student_id)
        .bind(RecipientStatus::Read.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of unread, unexpired in-app notifications for a student.
    pub async fn unread_count(pool: &PgPool, student_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_recipients \
             WHERE student_id = $1 AND in_app_enabled = true \
               AND read_at IS NULL AND status_id = $2",
        )
        .bind(student_id)
        .bind(RecipientStatus::Delivered.id())
        .fetch_one(pool)
        .await
    }

    /// Expire unread recipients of notifications whose `expires_at` has passed.
    ///
    /// Returns the number of recipient rows expired.
    pub async fn expire_due(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification_recipients r SET status_id = $2 \
             FROM notifications n \
             WHERE r.notification_id = n.id \
               AND n.expires_at IS NOT NULL AND n.expires_at < $1 \
               AND r.status_id IN ($3, $4)",
        )
        .bind(now)
        .bind(RecipientStatus::Expired.id())
        .bind(RecipientStatus::Pending.id())
        .bind(RecipientStatus::Delivered.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
