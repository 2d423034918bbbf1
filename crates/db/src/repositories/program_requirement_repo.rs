//! Repository for the `program_requirements` table.

use certtrack_core::requirement::{DEFAULT_GRACE_PERIOD_DAYS, DEFAULT_NOTIFICATION_DAYS};
use certtrack_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::program_requirement::{
    CreateProgramRequirement, ProgramRequirement, UpdateProgramRequirement,
};
use crate::models::status::RecurrenceType;

/// Column list for `program_requirements` queries.
const COLUMNS: &str = "id, program_id, certificate_type_id, name, target_year, \
    deadline_day, deadline_month, grace_period_days, notification_days_before_deadline, \
    is_mandatory, is_active, special_instruction, recurrence_type_id, \
    effective_from_year, effective_until_year, months_before_deadline, \
    last_recurrence_at, created_at, updated_at";

/// Provides CRUD operations for program requirements.
pub struct ProgramRequirementRepo;

impl ProgramRequirementRepo {
    /// Insert a new requirement, applying the default grace period (7 days),
    /// notification lead (90 days), mandatory flag and annual recurrence.
    ///
    /// A duplicate (program, certificate type, target year) fails with the
    /// `uq_program_req_prog_cert_year` unique violation.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateProgramRequirement,
    ) -> Result<ProgramRequirement, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO program_requirements \
                (program_id, certificate_type_id, name, target_year, deadline_day, \
                 deadline_month, grace_period_days, notification_days_before_deadline, \
                 is_mandatory, special_instruction, recurrence_type_id, \
                 effective_from_year, effective_until_year, months_before_deadline) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, {DEFAULT_GRACE_PERIOD_DAYS}), \
                 COALESCE($8, {DEFAULT_NOTIFICATION_DAYS}), COALESCE($9, true), $10, \
                 COALESCE($11, $12), $13, $14, $15) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProgramRequirement>(&query)
            .bind(input.program_id)
            .bind(input.certificate_type_id)
            .bind(&input.name)
            .bind(input.target_year)
            .bind(input.deadline_day)
            .bind(input.deadline_month)
            .bind(input.grace_period_days)
            .bind(input.notification_days_before_deadline)
            .bind(input.is_mandatory)
            .bind(&input.special_instruction)
            .bind(input.recurrence_type_id)
            .bind(RecurrenceType::default().id())
            .bind(input.effective_from_year)
            .bind(input.effective_until_year)
            .bind(input.months_before_deadline)
            .fetch_one(executor)
            .await
    }

    /// Find a requirement by its internal ID.
    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<ProgramRequirement>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM program_requirements WHERE id = $1");
        sqlx::query_as::<_, ProgramRequirement>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Update a requirement. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update<'e, E>(
        executor: E,
        id: DbId,
        input: &UpdateProgramRequirement,
    ) -> Result<Option<ProgramRequirement>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE program_requirements SET \
                name = COALESCE($2, name), \
                target_year = COALESCE($3, target_year), \
                deadline_day = COALESCE($4, deadline_day), \
                deadline_month = COALESCE($5, deadline_month), \
                grace_period_days = COALESCE($6, grace_period_days), \
                notification_days_before_deadline = COALESCE($7, notification_days_before_deadline), \
                is_mandatory = COALESCE($8, is_mandatory), \
                special_instruction = COALESCE($9, special_instruction), \
                recurrence_type_id = COALESCE($10, recurrence_type_id), \
                effective_from_year = COALESCE($11, effective_from_year), \
                effective_until_year = COALESCE($12, effective_until_year), \
                months_before_deadline = COALESCE($13, months_before_deadline) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProgramRequirement>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.target_year)
            .bind(input.deadline_day)
            .bind(input.deadline_month)
            .bind(input.grace_period_days)
            .bind(input.notification_days_before_deadline)
            .bind(input.is_mandatory)
            .bind(&input.special_instruction)
            .bind(input.recurrence_type_id)
            .bind(input.effective_from_year)
            .bind(input.effective_until_year)
            .bind(input.months_before_deadline)
            .fetch_optional(executor)
            .await
    }

    /// Deactivate a requirement and store its final `effective_until_year`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn archive<'e, E>(
        executor: E,
        id: DbId,
        effective_until_year: Option<i32>,
    ) -> Result<Option<ProgramRequirement>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE program_requirements \
             SET is_active = false, effective_until_year = $2 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProgramRequirement>(&query)
            .bind(id)
            .bind(effective_until_year)
            .fetch_optional(executor)
            .await
    }

    /// The highest academic year code that has a schedule for this requirement.
    pub async fn latest_scheduled_year_code<'e, E>(
        executor: E,
        requirement_id: DbId,
    ) -> Result<Option<i32>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT MAX(ay.year_code) \
             FROM program_requirement_schedules s \
             JOIN academic_years ay ON ay.id = s.academic_year_id \
             WHERE s.program_requirement_id = $1",
        )
        .bind(requirement_id)
        .fetch_one(executor)
        .await
    }

    /// Academic year codes that already have a schedule for this requirement.
    pub async fn scheduled_year_codes(
        pool: &PgPool,
        requirement_id: DbId,
    ) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT ay.year_code \
             FROM program_requirement_schedules s \
             JOIN academic_years ay ON ay.id = s.academic_year_id \
             WHERE s.program_requirement_id = $1 \
             ORDER BY ay.year_code",
        )
        .bind(requirement_id)
        .fetch_all(pool)
        .await
    }

    /// Active requirements with a planning lead (`months_before_deadline`).
    pub async fn list_active_recurring(
        pool: &PgPool,
    ) -> Result<Vec<ProgramRequirement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM program_requirements \
             WHERE is_active = true AND months_before_deadline IS NOT NULL \
             ORDER BY program_id, target_year"
        );
        sqlx::query_as::<_, ProgramRequirement>(&query)
            .fetch_all(pool)
            .await
    }

    /// Active requirements for a program, ordered by target year.
    pub async fn list_by_program(
        pool: &PgPool,
        program_id: DbId,
    ) -> Result<Vec<ProgramRequirement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM program_requirements \
             WHERE program_id = $1 AND is_active = true \
             ORDER BY target_year, name"
        );
        sqlx::query_as::<_, ProgramRequirement>(&query)
            .bind(program_id)
            .fetch_all(pool)
            .await
    }

    /// Record that the planner handled the cohort identified by `marker`.
    pub async fn set_last_recurrence(
        pool: &PgPool,
        id: DbId,
        marker: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE program_requirements SET last_recurrence_at = $2 WHERE id = $1")
            .bind(id)
            .bind(marker)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Deactivate every active requirement whose effective range ended
    /// before `academic_year`. Returns the number of rows archived.
    pub async fn archive_expired(pool: &PgPool, academic_year: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE program_requirements SET is_active = false \
             WHERE is_active = true \
               AND effective_until_year IS NOT NULL \
               AND effective_until_year < $1",
        )
        .bind(academic_year)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
