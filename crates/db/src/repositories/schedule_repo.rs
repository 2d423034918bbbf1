//! Repository for the `program_requirement_schedules` table.

use certtrack_core::reminder::OVERDUE_TAIL_DAYS;
use certtrack_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::schedule::{NewSchedule, Schedule, ScheduleContext, ScheduleDetails};

/// Column list for `program_requirement_schedules` queries.
const COLUMNS: &str = "id, program_requirement_id, academic_year_id, submission_deadline, \
    grace_period_deadline, start_notify_at, last_notified_at, created_at, updated_at";

/// Provides CRUD and reporting queries for schedules.
pub struct ScheduleRepo;

impl ScheduleRepo {
    /// Insert a derived schedule, returning the created row.
    ///
    /// A second schedule for the same (requirement, academic year) fails with
    /// the `uq_req_sched_req_year` unique violation.
    pub async fn create<'e, E>(executor: E, input: &NewSchedule) -> Result<Schedule, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO program_requirement_schedules \
                (program_requirement_id, academic_year_id, submission_deadline, \
                 grace_period_deadline, start_notify_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(input.program_requirement_id)
            .bind(input.academic_year_id)
            .bind(input.submission_deadline)
            .bind(input.grace_period_deadline)
            .bind(input.start_notify_at)
            .fetch_one(executor)
            .await
    }

    /// Find a schedule by its internal ID.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Schedule>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM program_requirement_schedules WHERE id = $1");
        sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find the schedule for a (requirement, academic year) pair.
    pub async fn find_for_pair<'e, E>(
        executor: E,
        requirement_id: DbId,
        academic_year_id: DbId,
    ) -> Result<Option<Schedule>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM program_requirement_schedules \
             WHERE program_requirement_id = $1 AND academic_year_id = $2"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(requirement_id)
            .bind(academic_year_id)
            .fetch_optional(executor)
            .await
    }

    /// Overwrite the academic year and derived deadlines of a schedule.
    ///
    /// The owning requirement is never changed. Returns `None` if no row
    /// with the given `id` exists.
    pub async fn update<'e, E>(
        executor: E,
        id: DbId,
        input: &NewSchedule,
    ) -> Result<Option<Schedule>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE program_requirement_schedules SET \
                academic_year_id = $2, \
                submission_deadline = $3, \
                grace_period_deadline = $4, \
                start_notify_at = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .bind(input.academic_year_id)
            .bind(input.submission_deadline)
            .bind(input.grace_period_deadline)
            .bind(input.start_notify_at)
            .fetch_optional(executor)
            .await
    }

    /// Schedules of active requirements inside the reminder window at `now`:
    /// `start_notify_at <= now <= grace_period_deadline + 7 days`.
    pub async fn list_notifiable(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<Schedule>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM program_requirement_schedules s \
             JOIN program_requirements r ON r.id = s.program_requirement_id \
             WHERE r.is_active = true \
               AND s.start_notify_at <= $1 \
               AND s.grace_period_deadline + make_interval(days => $2) >= $1 \
             ORDER BY s.submission_deadline",
            cols = prefixed_columns("s")
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(now)
            .bind(OVERDUE_TAIL_DAYS as i32)
            .fetch_all(pool)
            .await
    }

    /// Stamp the time the schedule's students were last notified.
    pub async fn mark_notified(pool: &PgPool, id: DbId, at: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE program_requirement_schedules SET last_notified_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Load the names needed to notify students about a schedule.
    pub async fn find_context(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ScheduleContext>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleContext>(
            "SELECT s.id AS schedule_id, r.id AS program_requirement_id, \
                    r.name AS requirement_name, r.is_mandatory, \
                    p.id AS program_id, p.code AS program_code, p.name AS program_name, \
                    ay.id AS academic_year_id, ay.year_code, \
                    s.submission_deadline, s.grace_period_deadline \
             FROM program_requirement_schedules s \
             JOIN program_requirements r ON r.id = s.program_requirement_id \
             JOIN programs p ON p.id = r.program_id \
             JOIN academic_years ay ON ay.id = s.academic_year_id \
             WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Every schedule with its program, certificate type, academic year,
    /// requirement and dashboard counters, for reporting.
    pub async fn list_with_details(pool: &PgPool) -> Result<Vec<ScheduleDetails>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleDetails>(
            "SELECT s.id AS schedule_id, r.id AS program_requirement_id, \
                    r.name AS requirement_name, r.is_mandatory, r.target_year, \
                    p.code AS program_code, p.name AS program_name, \
                    ct.code AS certificate_type_code, ct.name AS certificate_type_name, \
                    ay.year_code, s.submission_deadline, s.grace_period_deadline, \
                    s.start_notify_at, s.last_notified_at, \
                    ds.total_submissions_required, ds.submitted_count, ds.approved_count, \
                    ds.not_submitted_count, ds.overdue_count \
             FROM program_requirement_schedules s \
             JOIN program_requirements r ON r.id = s.program_requirement_id \
             JOIN programs p ON p.id = r.program_id \
             JOIN certificate_types ct ON ct.id = r.certificate_type_id \
             JOIN academic_years ay ON ay.id = s.academic_year_id \
             LEFT JOIN dashboard_stats ds ON ds.program_requirement_schedule_id = s.id \
             ORDER BY p.code, ay.year_code, s.submission_deadline",
        )
        .fetch_all(pool)
        .await
    }
}

/// `COLUMNS` qualified with a table alias, for joined queries.
fn prefixed_columns(alias: &str) -> String {
    COLUMNS
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
