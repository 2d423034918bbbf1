//! Program requirement schedule entity model and DTOs.

use certtrack_core::schedule::DerivedDeadlines;
use certtrack_core::templates::ScheduleMessage;
use certtrack_core::transport::TransportValue;
use certtrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `program_requirement_schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Schedule {
    pub id: DbId,
    pub program_requirement_id: DbId,
    pub academic_year_id: DbId,
    pub submission_deadline: Timestamp,
    pub grace_period_deadline: Timestamp,
    pub start_notify_at: Timestamp,
    pub last_notified_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Schedule {
    /// Event payload describing this schedule.
    pub fn to_transport(&self) -> TransportValue {
        TransportValue::map()
            .field("schedule_id", self.id)
            .field("program_requirement_id", self.program_requirement_id)
            .field("academic_year_id", self.academic_year_id)
            .field("submission_deadline", self.submission_deadline)
            .field("grace_period_deadline", self.grace_period_deadline)
            .field("start_notify_at", self.start_notify_at)
    }
}

/// Request to derive a schedule for a requirement in an academic year.
///
/// Used for both creation and in-place update; overrides fall back to the
/// requirement's defaults when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    pub program_requirement_id: DbId,
    pub academic_year_id: DbId,
    pub submission_deadline: Timestamp,
    pub grace_period_days: Option<i32>,
    pub notification_days_before_deadline: Option<i32>,
}

/// Fully derived values written to a schedule row.
#[derive(Debug, Clone, Copy)]
pub struct NewSchedule {
    pub program_requirement_id: DbId,
    pub academic_year_id: DbId,
    pub submission_deadline: Timestamp,
    pub grace_period_deadline: Timestamp,
    pub start_notify_at: Timestamp,
}

impl NewSchedule {
    pub fn new(
        program_requirement_id: DbId,
        academic_year_id: DbId,
        derived: DerivedDeadlines,
    ) -> Self {
        Self {
            program_requirement_id,
            academic_year_id,
            submission_deadline: derived.submission_deadline,
            grace_period_deadline: derived.grace_period_deadline,
            start_notify_at: derived.start_notify_at,
        }
    }
}

/// Schedule joined with the names needed to address students about it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleContext {
    pub schedule_id: DbId,
    pub program_requirement_id: DbId,
    pub requirement_name: String,
    pub is_mandatory: bool,
    pub program_id: DbId,
    pub program_code: String,
    pub program_name: String,
    pub academic_year_id: DbId,
    pub year_code: i32,
    pub submission_deadline: Timestamp,
    pub grace_period_deadline: Timestamp,
}

impl ScheduleContext {
    pub fn message(&self) -> ScheduleMessage {
        ScheduleMessage {
            requirement_name: self.requirement_name.clone(),
            program_name: self.program_name.clone(),
            program_code: self.program_code.clone(),
            academic_year: self.year_code,
            submission_deadline: self.submission_deadline,
            is_mandatory: self.is_mandatory,
        }
    }
}

/// Reporting row: schedule with program, certificate type, academic year,
/// requirement and (when present) dashboard counters.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleDetails {
    pub schedule_id: DbId,
    pub program_requirement_id: DbId,
    pub requirement_name: String,
    pub is_mandatory: bool,
    pub target_year: i32,
    pub program_code: String,
    pub program_name: String,
    pub certificate_type_code: String,
    pub certificate_type_name: String,
    pub year_code: i32,
    pub submission_deadline: Timestamp,
    pub grace_period_deadline: Timestamp,
    pub start_notify_at: Timestamp,
    pub last_notified_at: Option<Timestamp>,
    pub total_submissions_required: Option<i32>,
    pub submitted_count: Option<i32>,
    pub approved_count: Option<i32>,
    pub not_submitted_count: Option<i32>,
    pub overdue_count: Option<i32>,
}
