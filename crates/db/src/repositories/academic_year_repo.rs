//! Repository for the `academic_years` table.

use certtrack_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::academic_year::{AcademicYear, CreateAcademicYear};

/// Column list for `academic_years` queries.
const COLUMNS: &str = "id, year_code, start_date, end_date, is_current, created_at, updated_at";

/// Provides lookups and creation for academic years.
pub struct AcademicYearRepo;

impl AcademicYearRepo {
    /// Insert a new academic year, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAcademicYear,
    ) -> Result<AcademicYear, sqlx::Error> {
        let query = format!(
            "INSERT INTO academic_years (year_code, start_date, end_date, is_current) \
             VALUES ($1, $2, $3, COALESCE($4, false)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AcademicYear>(&query)
            .bind(input.year_code)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.is_current)
            .fetch_one(pool)
            .await
    }

    /// Find an academic year by its internal ID.
    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<AcademicYear>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM academic_years WHERE id = $1");
        sqlx::query_as::<_, AcademicYear>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find an academic year by its year code (e.g. `2024`).
    pub async fn find_by_year_code(
        pool: &PgPool,
        year_code: i32,
    ) -> Result<Option<AcademicYear>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM academic_years WHERE year_code = $1");
        sqlx::query_as::<_, AcademicYear>(&query)
            .bind(year_code)
            .fetch_optional(pool)
            .await
    }

    /// Return the academic year for `year_code`, creating it with the given
    /// bounds (and `is_current = false`) when it does not exist yet.
    pub async fn get_or_create(
        pool: &PgPool,
        year_code: i32,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> Result<AcademicYear, sqlx::Error> {
        sqlx::query(
            "INSERT INTO academic_years (year_code, start_date, end_date, is_current) \
             VALUES ($1, $2, $3, false) \
             ON CONFLICT (year_code) DO NOTHING",
        )
        .bind(year_code)
        .bind(start_date)
        .bind(end_date)
        .execute(pool)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM academic_years WHERE year_code = $1");
        sqlx::query_as::<_, AcademicYear>(&query)
            .bind(year_code)
            .fetch_one(pool)
            .await
    }

    /// The smallest year code on record, if any.
    pub async fn earliest_year_code<'e, E>(executor: E) -> Result<Option<i32>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT MIN(year_code) FROM academic_years")
            .fetch_one(executor)
            .await
    }
}
