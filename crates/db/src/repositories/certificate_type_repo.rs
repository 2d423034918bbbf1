//! Repository for the `certificate_types` table.

use certtrack_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::certificate_type::{CertificateType, CreateCertificateType};

/// Column list for `certificate_types` queries.
const COLUMNS: &str = "id, code, name, is_active, created_at, updated_at";

/// Provides lookups and creation for certificate types.
pub struct CertificateTypeRepo;

impl CertificateTypeRepo {
    /// Insert a new certificate type, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCertificateType,
    ) -> Result<CertificateType, sqlx::Error> {
        let query = format!(
            "INSERT INTO certificate_types (code, name, is_active) \
             VALUES ($1, $2, COALESCE($3, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CertificateType>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a certificate type by its internal ID.
    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<CertificateType>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM certificate_types WHERE id = $1");
        sqlx::query_as::<_, CertificateType>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
