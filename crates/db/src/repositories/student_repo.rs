//! Repository for the `students` table.

use certtrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::student::{CreateStudent, Recipient, Student};

/// Column list for `students` queries.
const COLUMNS: &str = "id, student_code, first_name, last_name, program_id, \
    academic_year_id, line_user_id, is_active, created_at, updated_at";

/// Provides student lookups used for notification addressing.
pub struct StudentRepo;

impl StudentRepo {
    /// Insert a new student, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateStudent) -> Result<Student, sqlx::Error> {
        let query = format!(
            "INSERT INTO students \
                (student_code, first_name, last_name, program_id, academic_year_id, line_user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(&input.student_code)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.program_id)
            .bind(input.academic_year_id)
            .bind(&input.line_user_id)
            .fetch_one(pool)
            .await
    }

    /// Number of active students in a program cohort.
    pub async fn count_active_in_cohort(
        pool: &PgPool,
        program_id: DbId,
        academic_year_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM students \
             WHERE program_id = $1 AND academic_year_id = $2 AND is_active = true",
        )
        .bind(program_id)
        .bind(academic_year_id)
        .fetch_one(pool)
        .await
    }

    /// Active students of a program cohort, with their LINE ids.
    pub async fn recipients_for_cohort(
        pool: &PgPool,
        program_id: DbId,
        academic_year_id: DbId,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        sqlx::query_as::<_, Recipient>(
            "SELECT id AS student_id, line_user_id FROM students \
             WHERE program_id = $1 AND academic_year_id = $2 AND is_active = true \
             ORDER BY student_code",
        )
        .bind(program_id)
        .bind(academic_year_id)
        .fetch_all(pool)
        .await
    }
}
