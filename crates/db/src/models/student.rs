//! Student entity model and DTOs.
//!
//! Students are maintained by the registrar import; this crate reads them to
//! address notifications.

use certtrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `students` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Student {
    pub id: DbId,
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub program_id: DbId,
    /// Academic year the student entered the program (cohort).
    pub academic_year_id: DbId,
    pub line_user_id: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new student.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudent {
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub program_id: DbId,
    pub academic_year_id: DbId,
    pub line_user_id: Option<String>,
}

/// A student to notify, with their LINE id when linked.
#[derive(Debug, Clone, FromRow)]
pub struct Recipient {
    pub student_id: DbId,
    pub line_user_id: Option<String>,
}
