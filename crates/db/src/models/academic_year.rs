//! Academic year entity model and DTOs.

use certtrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `academic_years` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AcademicYear {
    pub id: DbId,
    pub year_code: i32,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub is_current: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new academic year.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAcademicYear {
    pub year_code: i32,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub is_current: Option<bool>,
}
