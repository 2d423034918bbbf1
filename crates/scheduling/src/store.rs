//! Storage seam for the scheduling services.
//!
//! A [`SchedulingStore`] hands out [`SchedulingUnit`]s: one unit of work per
//! service operation. Everything read or written through a unit is committed
//! together by [`SchedulingUnit::commit`]; dropping a unit rolls it back.
//!
//! Uniqueness is enforced by the store, not by the services. Implementations
//! report a violated unique constraint as [`StoreError::UniqueViolation`]
//! carrying the constraint name, so callers can map it to a domain error.

use std::future::Future;

use certtrack_core::error::CoreError;
use certtrack_core::types::DbId;
use certtrack_db::models::academic_year::AcademicYear;
use certtrack_db::models::certificate_type::CertificateType;
use certtrack_db::models::program::Program;
use certtrack_db::models::program_requirement::{
    CreateProgramRequirement, ProgramRequirement, UpdateProgramRequirement,
};
use certtrack_db::models::schedule::{NewSchedule, Schedule};

/// One schedule per (requirement, academic year).
pub const SCHEDULE_PAIR_CONSTRAINT: &str = "uq_req_sched_req_year";

/// One requirement per (program, certificate type, target year).
pub const REQUIREMENT_KEY_CONSTRAINT: &str = "uq_program_req_prog_cert_year";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint {constraint} violated")]
    UniqueViolation { constraint: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Name of the violated unique constraint, if this is a unique violation.
    pub fn unique_constraint(&self) -> Option<&str> {
        match self {
            Self::UniqueViolation { constraint } => Some(constraint),
            Self::Database(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match certtrack_db::unique_violation(&err) {
            Some(constraint) => Self::UniqueViolation { constraint },
            None => Self::Database(err),
        }
    }
}

/// Anything the services did not map explicitly surfaces as `OperationFailed`.
impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Scheduling store operation failed");
        CoreError::OperationFailed(err.to_string())
    }
}

/// Source of units of work.
pub trait SchedulingStore: Send + Sync {
    type Unit: SchedulingUnit;

    /// Open a new unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::Unit, StoreError>> + Send;
}

/// Lookups and writes available inside one unit of work.
pub trait SchedulingUnit: Send {
    fn program(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<Program>, StoreError>> + Send;

    fn certificate_type(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<CertificateType>, StoreError>> + Send;

    fn academic_year(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<AcademicYear>, StoreError>> + Send;

    fn requirement(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<ProgramRequirement>, StoreError>> + Send;

    fn schedule(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<Schedule>, StoreError>> + Send;

    /// The schedule of `requirement_id` in `academic_year_id`, if any.
    fn schedule_for_pair(
        &mut self,
        requirement_id: DbId,
        academic_year_id: DbId,
    ) -> impl Future<Output = Result<Option<Schedule>, StoreError>> + Send;

    /// Lowest `year_code` among all academic years.
    fn earliest_year_code(
        &mut self,
    ) -> impl Future<Output = Result<Option<i32>, StoreError>> + Send;

    /// Highest `year_code` of an academic year scheduled for `requirement_id`.
    fn latest_scheduled_year_code(
        &mut self,
        requirement_id: DbId,
    ) -> impl Future<Output = Result<Option<i32>, StoreError>> + Send;

    /// Insert a schedule; fails with [`SCHEDULE_PAIR_CONSTRAINT`] on a duplicate pair.
    fn insert_schedule(
        &mut self,
        input: &NewSchedule,
    ) -> impl Future<Output = Result<Schedule, StoreError>> + Send;

    /// Overwrite the academic year and deadlines of a schedule.
    fn update_schedule(
        &mut self,
        id: DbId,
        input: &NewSchedule,
    ) -> impl Future<Output = Result<Option<Schedule>, StoreError>> + Send;

    /// Insert a requirement with defaults applied; fails with
    /// [`REQUIREMENT_KEY_CONSTRAINT`] on a duplicate key.
    fn insert_requirement(
        &mut self,
        input: &CreateProgramRequirement,
    ) -> impl Future<Output = Result<ProgramRequirement, StoreError>> + Send;

    /// Apply the non-`None` fields of `input`.
    fn update_requirement(
        &mut self,
        id: DbId,
        input: &UpdateProgramRequirement,
    ) -> impl Future<Output = Result<Option<ProgramRequirement>, StoreError>> + Send;

    /// Deactivate a requirement and store its final `effective_until_year`.
    fn archive_requirement(
        &mut self,
        id: DbId,
        effective_until_year: Option<i32>,
    ) -> impl Future<Output = Result<Option<ProgramRequirement>, StoreError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
