//! Program entity model and DTOs.

use certtrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `programs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Program {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub duration_years: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new program.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgram {
    pub code: String,
    pub name: String,
    pub duration_years: i32,
    /// Defaults to `true` if omitted.
    pub is_active: Option<bool>,
}
