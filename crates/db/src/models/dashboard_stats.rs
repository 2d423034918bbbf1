//! Dashboard statistics entity model.

use certtrack_core::dashboard::SubmissionCounts;
use certtrack_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `dashboard_stats` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DashboardStats {
    pub id: DbId,
    pub program_requirement_schedule_id: DbId,
    pub total_submissions_required: i32,
    pub submitted_count: i32,
    pub approved_count: i32,
    pub rejected_count: i32,
    pub pending_count: i32,
    pub manual_review_count: i32,
    pub not_submitted_count: i32,
    pub on_time_submissions: i32,
    pub late_submissions: i32,
    pub overdue_count: i32,
    pub manual_verification_count: i32,
    pub agent_verification_count: i32,
    pub last_calculated_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DashboardStats {
    pub fn counts(&self) -> SubmissionCounts {
        SubmissionCounts {
            total_submissions_required: self.total_submissions_required,
            submitted_count: self.submitted_count,
            approved_count: self.approved_count,
            rejected_count: self.rejected_count,
            pending_count: self.pending_count,
            manual_review_count: self.manual_review_count,
            not_submitted_count: self.not_submitted_count,
            on_time_submissions: self.on_time_submissions,
            late_submissions: self.late_submissions,
            overdue_count: self.overdue_count,
            manual_verification_count: self.manual_verification_count,
            agent_verification_count: self.agent_verification_count,
        }
    }
}
