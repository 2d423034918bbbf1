//! Repository for the `programs` table.

use certtrack_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::program::{CreateProgram, Program};

/// Column list for `programs` queries.
const COLUMNS: &str = "id, code, name, duration_years, is_active, created_at, updated_at";

/// Provides lookups and creation for programs.
pub struct ProgramRepo;

impl ProgramRepo {
    /// Insert a new program, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProgram) -> Result<Program, sqlx::Error> {
        let query = format!(
            "INSERT INTO programs (code, name, duration_years, is_active) \
             VALUES ($1, $2, $3, COALESCE($4, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Program>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(input.duration_years)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a program by its internal ID.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Program>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM programs WHERE id = $1");
        sqlx::query_as::<_, Program>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Activate or deactivate a program. Returns `true` if a row was updated.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE programs SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
