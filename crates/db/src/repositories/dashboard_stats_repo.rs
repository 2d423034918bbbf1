//! Repository for the `dashboard_stats` table.

use certtrack_core::dashboard::SubmissionCounts;
use certtrack_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::dashboard_stats::DashboardStats;

/// Column list for `dashboard_stats` queries.
const COLUMNS: &str = "id, program_requirement_schedule_id, total_submissions_required, \
    submitted_count, approved_count, rejected_count, pending_count, manual_review_count, \
    not_submitted_count, on_time_submissions, late_submissions, overdue_count, \
    manual_verification_count, agent_verification_count, last_calculated_at, \
    created_at, updated_at";

/// Provides access to per-schedule dashboard counters.
pub struct DashboardStatsRepo;

impl DashboardStatsRepo {
    /// Create the counters row for a schedule.
    ///
    /// Returns `None` when the schedule already has one.
    pub async fn create_for_schedule(
        pool: &PgPool,
        schedule_id: DbId,
        counts: &SubmissionCounts,
    ) -> Result<Option<DashboardStats>, sqlx::Error> {
        let query = format!(
            "INSERT INTO dashboard_stats \
                (program_requirement_schedule_id, total_submissions_required, \
                 not_submitted_count) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (program_requirement_schedule_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DashboardStats>(&query)
            .bind(schedule_id)
            .bind(counts.total_submissions_required)
            .bind(counts.not_submitted_count)
            .fetch_optional(pool)
            .await
    }

    /// Find the counters row for a schedule.
    pub async fn find_by_schedule<'e, E>(
        executor: E,
        schedule_id: DbId,
    ) -> Result<Option<DashboardStats>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM dashboard_stats WHERE program_requirement_schedule_id = $1"
        );
        sqlx::query_as::<_, DashboardStats>(&query)
            .bind(schedule_id)
            .fetch_optional(executor)
            .await
    }

    /// Overwrite every counter and refresh `last_calculated_at`.
    ///
    /// Callers validate `counts` first; the table's CHECK constraints reject
    /// inconsistent rows regardless.
    pub async fn update_counts<'e, E>(
        executor: E,
        schedule_id: DbId,
        counts: &SubmissionCounts,
    ) -> Result<Option<DashboardStats>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE dashboard_stats SET \
                total_submissions_required = $2, submitted_count = $3, approved_count = $4, \
                rejected_count = $5, pending_count = $6, manual_review_count = $7, \
                not_submitted_count = $8, on_time_submissions = $9, late_submissions = $10, \
                overdue_count = $11, manual_verification_count = $12, \
                agent_verification_count = $13, last_calculated_at = NOW() \
             WHERE program_requirement_schedule_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DashboardStats>(&query)
            .bind(schedule_id)
            .bind(counts.total_submissions_required)
            .bind(counts.submitted_count)
            .bind(counts.approved_count)
            .bind(counts.rejected_count)
            .bind(counts.pending_count)
            .bind(counts.manual_review_count)
            .bind(counts.not_submitted_count)
            .bind(counts.on_time_submissions)
            .bind(counts.late_submissions)
            .bind(counts.overdue_count)
            .bind(counts.manual_verification_count)
            .bind(counts.agent_verification_count)
            .fetch_optional(executor)
            .await
    }
}
