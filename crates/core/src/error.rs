use crate::types::{DbId, Timestamp};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("{entity} {id} is not active")]
    Inactive { entity: &'static str, id: DbId },

    #[error("Program requirement {0} is already archived")]
    AlreadyArchived(DbId),

    #[error("Target year {target_year} exceeds program duration of {duration_years} years")]
    DurationExceeded { target_year: i32, duration_years: i32 },

    #[error("Deadline {deadline} is outside the window {window_start} .. {window_end}")]
    OutOfWindow {
        deadline: Timestamp,
        window_start: Timestamp,
        window_end: Timestamp,
    },

    #[error("A schedule already exists for requirement {requirement_id} in academic year {academic_year_id}")]
    DuplicateSchedule {
        requirement_id: DbId,
        academic_year_id: DbId,
    },

    #[error("A requirement already exists for this program, certificate type and target year")]
    DuplicateRequirement,

    #[error("The program requirement of an existing schedule cannot be changed")]
    ImmutableLink,

    #[error("Date constraint violated: {0}")]
    DateConstraintViolation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}
