//! Certificate type entity model and DTOs.

use certtrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `certificate_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CertificateType {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new certificate type.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCertificateType {
    pub code: String,
    pub name: String,
    pub is_active: Option<bool>,
}
