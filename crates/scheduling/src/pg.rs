//! PostgreSQL-backed [`SchedulingStore`].
//!
//! Each unit of work is a database transaction. The repositories run against
//! the transaction's connection; unique violations come back from Postgres
//! with the same constraint names the services match on.

use certtrack_core::types::DbId;
use certtrack_db::models::academic_year::AcademicYear;
use certtrack_db::models::certificate_type::CertificateType;
use certtrack_db::models::program::Program;
use certtrack_db::models::program_requirement::{
    CreateProgramRequirement, ProgramRequirement, UpdateProgramRequirement,
};
use certtrack_db::models::schedule::{NewSchedule, Schedule};
use certtrack_db::repositories::{
    AcademicYearRepo, CertificateTypeRepo, ProgramRepo, ProgramRequirementRepo, ScheduleRepo,
};
use certtrack_db::DbPool;
use sqlx::{Postgres, Transaction};

use crate::store::{SchedulingStore, SchedulingUnit, StoreError};

#[derive(Clone)]
pub struct PgSchedulingStore {
    pool: DbPool,
}

impl PgSchedulingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SchedulingStore for PgSchedulingStore {
    type Unit = PgUnit;

    async fn begin(&self) -> Result<PgUnit, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgUnit { tx })
    }
}

/// An open transaction. Rolled back on drop unless committed.
pub struct PgUnit {
    tx: Transaction<'static, Postgres>,
}

impl SchedulingUnit for PgUnit {
    async fn program(&mut self, id: DbId) -> Result<Option<Program>, StoreError> {
        Ok(ProgramRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn certificate_type(&mut self, id: DbId) -> Result<Option<CertificateType>, StoreError> {
        Ok(CertificateTypeRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn academic_year(&mut self, id: DbId) -> Result<Option<AcademicYear>, StoreError> {
        Ok(AcademicYearRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn requirement(&mut self, id: DbId) -> Result<Option<ProgramRequirement>, StoreError> {
        Ok(ProgramRequirementRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn schedule(&mut self, id: DbId) -> Result<Option<Schedule>, StoreError> {
        Ok(ScheduleRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn schedule_for_pair(
        &mut self,
        requirement_id: DbId,
        academic_year_id: DbId,
    ) -> Result<Option<Schedule>, StoreError> {
        Ok(ScheduleRepo::find_for_pair(&mut *self.tx, requirement_id, academic_year_id).await?)
    }

    async fn earliest_year_code(&mut self) -> Result<Option<i32>, StoreError> {
        Ok(AcademicYearRepo::earliest_year_code(&mut *self.tx).await?)
    }

    async fn latest_scheduled_year_code(
        &mut self,
        requirement_id: DbId,
    ) -> Result<Option<i32>, StoreError> {
        Ok(ProgramRequirementRepo::latest_scheduled_year_code(&mut *self.tx, requirement_id).await?)
    }

    async fn insert_schedule(&mut self, input: &NewSchedule) -> Result<Schedule, StoreError> {
        Ok(ScheduleRepo::create(&mut *self.tx, input).await?)
    }

    async fn update_schedule(
        &mut self,
        id: DbId,
        input: &NewSchedule,
    ) -> Result<Option<Schedule>, StoreError> {
        Ok(ScheduleRepo::update(&mut *self.tx, id, input).await?)
    }

    async fn insert_requirement(
        &mut self,
        input: &CreateProgramRequirement,
    ) -> Result<ProgramRequirement, StoreError> {
        Ok(ProgramRequirementRepo::create(&mut *self.tx, input).await?)
    }

    async fn update_requirement(
        &mut self,
        id: DbId,
        input: &UpdateProgramRequirement,
    ) -> Result<Option<ProgramRequirement>, StoreError> {
        Ok(ProgramRequirementRepo::update(&mut *self.tx, id, input).await?)
    }

    async fn archive_requirement(
        &mut self,
        id: DbId,
        effective_until_year: Option<i32>,
    ) -> Result<Option<ProgramRequirement>, StoreError> {
        Ok(ProgramRequirementRepo::archive(&mut *self.tx, id, effective_until_year).await?)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
