//! Notification entity models and DTOs.

use certtrack_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::StatusId;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub notification_code: String,
    pub entity_type: String,
    pub entity_id: DbId,
    pub actor_type: String,
    pub actor_id: Option<DbId>,
    pub request_id: Option<DbId>,
    pub priority_id: StatusId,
    pub subject: String,
    pub body: String,
    pub line_subject: String,
    pub line_body: String,
    pub metadata: serde_json::Value,
    pub scheduled_for: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// A row from the `notification_recipients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationRecipient {
    pub id: DbId,
    pub notification_id: DbId,
    pub student_id: DbId,
    pub in_app_enabled: bool,
    pub line_app_enabled: bool,
    pub status_id: StatusId,
    pub delivered_at: Option<Timestamp>,
    pub read_at: Option<Timestamp>,
    pub line_app_sent_at: Option<Timestamp>,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
}

/// In-app notification as shown in a student's list.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InboxItem {
    pub recipient_id: DbId,
    pub notification_id: DbId,
    pub notification_code: String,
    pub subject: String,
    pub body: String,
    pub priority_id: StatusId,
    pub status_id: StatusId,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Values for a new `notifications` row.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub notification_code: String,
    pub entity_type: String,
    pub entity_id: DbId,
    pub actor_type: String,
    pub actor_id: Option<DbId>,
    pub request_id: Option<DbId>,
    pub priority_id: StatusId,
    pub subject: String,
    pub body: String,
    pub line_subject: String,
    pub line_body: String,
    pub metadata: serde_json::Value,
    pub scheduled_for: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
}

/// Values for a new `notification_recipients` row.
#[derive(Debug, Clone)]
pub struct NewRecipient {
    pub student_id: DbId,
    pub in_app_enabled: bool,
    pub line_app_enabled: bool,
}
