//! In-memory [`SchedulingStore`] for tests and local tooling.
//!
//! A unit of work holds the store lock for its whole lifetime and works on a
//! copy of the state. `commit` swaps the copy in; dropping the unit discards
//! it. The unique constraints of the PostgreSQL schema are enforced with the
//! same names.

use std::collections::HashMap;
use std::sync::Arc;

use certtrack_core::academic_calendar::academic_year_bounds;
use certtrack_core::requirement::{DEFAULT_GRACE_PERIOD_DAYS, DEFAULT_NOTIFICATION_DAYS};
use certtrack_core::types::{DbId, Timestamp};
use certtrack_db::models::academic_year::AcademicYear;
use certtrack_db::models::certificate_type::CertificateType;
use certtrack_db::models::program::Program;
use certtrack_db::models::program_requirement::{
    CreateProgramRequirement, ProgramRequirement, UpdateProgramRequirement,
};
use certtrack_db::models::schedule::{NewSchedule, Schedule};
use certtrack_db::models::status::RecurrenceType;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::store::{
    SchedulingStore, SchedulingUnit, StoreError, REQUIREMENT_KEY_CONSTRAINT,
    SCHEDULE_PAIR_CONSTRAINT,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    programs: HashMap<DbId, Program>,
    certificate_types: HashMap<DbId, CertificateType>,
    academic_years: HashMap<DbId, AcademicYear>,
    requirements: HashMap<DbId, ProgramRequirement>,
    schedules: HashMap<DbId, Schedule>,
}

impl MemoryState {
    fn year_code(&self, academic_year_id: DbId) -> Option<i32> {
        self.academic_years.get(&academic_year_id).map(|ay| ay.year_code)
    }

    fn pair_taken(
        &self,
        requirement_id: DbId,
        academic_year_id: DbId,
        except: Option<DbId>,
    ) -> bool {
        self.schedules.values().any(|s| {
            s.program_requirement_id == requirement_id
                && s.academic_year_id == academic_year_id
                && Some(s.id) != except
        })
    }

    fn key_taken(
        &self,
        program_id: DbId,
        certificate_type_id: DbId,
        target_year: i32,
        except: Option<DbId>,
    ) -> bool {
        self.requirements.values().any(|r| {
            r.program_id == program_id
                && r.certificate_type_id == certificate_type_id
                && r.target_year == target_year
                && Some(r.id) != except
        })
    }
}

fn unique_violation(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

/// Shared in-memory state. Clones refer to the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    pub async fn add_program(&self, code: &str, duration_years: i32, is_active: bool) -> Program {
        let now = Utc::now();
        let program = Program {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_string(),
            duration_years,
            is_active,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .programs
            .insert(program.id, program.clone());
        program
    }

    pub async fn add_certificate_type(&self, code: &str, is_active: bool) -> CertificateType {
        let now = Utc::now();
        let certificate_type = CertificateType {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_string(),
            is_active,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .certificate_types
            .insert(certificate_type.id, certificate_type.clone());
        certificate_type
    }

    /// Add an academic year with explicit bounds.
    pub async fn add_academic_year_with(
        &self,
        year_code: i32,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> AcademicYear {
        let now = Utc::now();
        let academic_year = AcademicYear {
            id: Uuid::new_v4(),
            year_code,
            start_date,
            end_date,
            is_current: false,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .academic_years
            .insert(academic_year.id, academic_year.clone());
        academic_year
    }

    /// Add an academic year with the standard August-to-May bounds.
    pub async fn add_academic_year(&self, year_code: i32) -> Option<AcademicYear> {
        let (start, end) = academic_year_bounds(year_code)?;
        Some(self.add_academic_year_with(year_code, start, end).await)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub async fn schedules(&self) -> Vec<Schedule> {
        let mut schedules: Vec<Schedule> =
            self.state.lock().await.schedules.values().cloned().collect();
        schedules.sort_by_key(|s| s.created_at);
        schedules
    }

    pub async fn requirement(&self, id: DbId) -> Option<ProgramRequirement> {
        self.state.lock().await.requirements.get(&id).cloned()
    }
}

impl SchedulingStore for MemoryStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<MemoryUnit, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnit { guard, working })
    }
}

/// Exclusive access to the store plus the uncommitted working copy.
pub struct MemoryUnit {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl SchedulingUnit for MemoryUnit {
    async fn program(&mut self, id: DbId) -> Result<Option<Program>, StoreError> {
        Ok(self.working.programs.get(&id).cloned())
    }

    async fn certificate_type(&mut self, id: DbId) -> Result<Option<CertificateType>, StoreError> {
        Ok(self.working.certificate_types.get(&id).cloned())
    }

    async fn academic_year(&mut self, id: DbId) -> Result<Option<AcademicYear>, StoreError> {
        Ok(self.working.academic_years.get(&id).cloned())
    }

    async fn requirement(&mut self, id: DbId) -> Result<Option<ProgramRequirement>, StoreError> {
        Ok(self.working.requirements.get(&id).cloned())
    }

    async fn schedule(&mut self, id: DbId) -> Result<Option<Schedule>, StoreError> {
        Ok(self.working.schedules.get(&id).cloned())
    }

    async fn schedule_for_pair(
        &mut self,
        requirement_id: DbId,
        academic_year_id: DbId,
    ) -> Result<Option<Schedule>, StoreError> {
        Ok(self
            .working
            .schedules
            .values()
            .find(|s| {
                s.program_requirement_id == requirement_id && s.academic_year_id == academic_year_id
            })
            .cloned())
    }

    async fn earliest_year_code(&mut self) -> Result<Option<i32>, StoreError> {
        Ok(self.working.academic_years.values().map(|ay| ay.year_code).min())
    }

    async fn latest_scheduled_year_code(
        &mut self,
        requirement_id: DbId,
    ) -> Result<Option<i32>, StoreError> {
        Ok(self
            .working
            .schedules
            .values()
            .filter(|s| s.program_requirement_id == requirement_id)
            .filter_map(|s| self.working.year_code(s.academic_year_id))
            .max())
    }

    async fn insert_schedule(&mut self, input: &NewSchedule) -> Result<Schedule, StoreError> {
        if self
            .working
            .pair_taken(input.program_requirement_id, input.academic_year_id, None)
        {
            return Err(unique_violation(SCHEDULE_PAIR_CONSTRAINT));
        }
        let now = Utc::now();
        let schedule = Schedule {
            id: Uuid::new_v4(),
            program_requirement_id: input.program_requirement_id,
            academic_year_id: input.academic_year_id,
            submission_deadline: input.submission_deadline,
            grace_period_deadline: input.grace_period_deadline,
            start_notify_at: input.start_notify_at,
            last_notified_at: None,
            created_at: now,
            updated_at: now,
        };
        self.working.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    async fn update_schedule(
        &mut self,
        id: DbId,
        input: &NewSchedule,
    ) -> Result<Option<Schedule>, StoreError> {
        let Some(current) = self.working.schedules.get(&id) else {
            return Ok(None);
        };
        if self
            .working
            .pair_taken(current.program_requirement_id, input.academic_year_id, Some(id))
        {
            return Err(unique_violation(SCHEDULE_PAIR_CONSTRAINT));
        }
        let Some(schedule) = self.working.schedules.get_mut(&id) else {
            return Ok(None);
        };
        schedule.academic_year_id = input.academic_year_id;
        schedule.submission_deadline = input.submission_deadline;
        schedule.grace_period_deadline = input.grace_period_deadline;
        schedule.start_notify_at = input.start_notify_at;
        schedule.updated_at = Utc::now();
        Ok(Some(schedule.clone()))
    }

    async fn insert_requirement(
        &mut self,
        input: &CreateProgramRequirement,
    ) -> Result<ProgramRequirement, StoreError> {
        if self.working.key_taken(
            input.program_id,
            input.certificate_type_id,
            input.target_year,
            None,
        ) {
            return Err(unique_violation(REQUIREMENT_KEY_CONSTRAINT));
        }
        let now = Utc::now();
        let requirement = ProgramRequirement {
            id: Uuid::new_v4(),
            program_id: input.program_id,
            certificate_type_id: input.certificate_type_id,
            name: input.name.clone(),
            target_year: input.target_year,
            deadline_day: input.deadline_day,
            deadline_month: input.deadline_month,
            grace_period_days: input.grace_period_days.unwrap_or(DEFAULT_GRACE_PERIOD_DAYS),
            notification_days_before_deadline: input
                .notification_days_before_deadline
                .unwrap_or(DEFAULT_NOTIFICATION_DAYS),
            is_mandatory: input.is_mandatory.unwrap_or(true),
            is_active: true,
            special_instruction: input.special_instruction.clone(),
            recurrence_type_id: input
                .recurrence_type_id
                .unwrap_or(RecurrenceType::default().id()),
            effective_from_year: input.effective_from_year,
            effective_until_year: input.effective_until_year,
            months_before_deadline: input.months_before_deadline,
            last_recurrence_at: None,
            created_at: now,
            updated_at: now,
        };
        self.working
            .requirements
            .insert(requirement.id, requirement.clone());
        Ok(requirement)
    }

    async fn update_requirement(
        &mut self,
        id: DbId,
        input: &UpdateProgramRequirement,
    ) -> Result<Option<ProgramRequirement>, StoreError> {
        let Some(current) = self.working.requirements.get(&id) else {
            return Ok(None);
        };
        let target_year = input.target_year.unwrap_or(current.target_year);
        if self.working.key_taken(
            current.program_id,
            current.certificate_type_id,
            target_year,
            Some(id),
        ) {
            return Err(unique_violation(REQUIREMENT_KEY_CONSTRAINT));
        }
        let Some(r) = self.working.requirements.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            r.name = name.clone();
        }
        r.target_year = target_year;
        r.deadline_day = input.deadline_day.unwrap_or(r.deadline_day);
        r.deadline_month = input.deadline_month.unwrap_or(r.deadline_month);
        r.grace_period_days = input.grace_period_days.unwrap_or(r.grace_period_days);
        r.notification_days_before_deadline = input
            .notification_days_before_deadline
            .unwrap_or(r.notification_days_before_deadline);
        r.is_mandatory = input.is_mandatory.unwrap_or(r.is_mandatory);
        if input.special_instruction.is_some() {
            r.special_instruction = input.special_instruction.clone();
        }
        r.recurrence_type_id = input.recurrence_type_id.unwrap_or(r.recurrence_type_id);
        r.effective_from_year = input.effective_from_year.or(r.effective_from_year);
        r.effective_until_year = input.effective_until_year.or(r.effective_until_year);
        r.months_before_deadline = input.months_before_deadline.or(r.months_before_deadline);
        r.updated_at = Utc::now();
        Ok(Some(r.clone()))
    }

    async fn archive_requirement(
        &mut self,
        id: DbId,
        effective_until_year: Option<i32>,
    ) -> Result<Option<ProgramRequirement>, StoreError> {
        let Some(r) = self.working.requirements.get_mut(&id) else {
            return Ok(None);
        };
        r.is_active = false;
        r.effective_until_year = effective_until_year;
        r.updated_at = Utc::now();
        Ok(Some(r.clone()))
    }

    async fn commit(self) -> Result<(), StoreError> {
        let Self { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeDelta;

    fn new_schedule(requirement_id: DbId, academic_year_id: DbId) -> NewSchedule {
        let deadline = Utc::now();
        NewSchedule {
            program_requirement_id: requirement_id,
            academic_year_id,
            submission_deadline: deadline,
            grace_period_deadline: deadline + TimeDelta::days(7),
            start_notify_at: deadline - TimeDelta::days(90),
        }
    }

    #[tokio::test]
    async fn dropped_unit_rolls_back() {
        let store = MemoryStore::new();
        let (req, ay) = (Uuid::new_v4(), Uuid::new_v4());
        {
            let mut unit = store.begin().await.unwrap();
            unit.insert_schedule(&new_schedule(req, ay)).await.unwrap();
        }
        assert!(store.schedules().await.is_empty());

        let mut unit = store.begin().await.unwrap();
        unit.insert_schedule(&new_schedule(req, ay)).await.unwrap();
        unit.commit().await.unwrap();
        assert_eq!(store.schedules().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_pair_reports_constraint_name() {
        let store = MemoryStore::new();
        let (req, ay) = (Uuid::new_v4(), Uuid::new_v4());
        let mut unit = store.begin().await.unwrap();
        unit.insert_schedule(&new_schedule(req, ay)).await.unwrap();
        let err = unit.insert_schedule(&new_schedule(req, ay)).await.unwrap_err();
        assert_matches!(err.unique_constraint(), Some(SCHEDULE_PAIR_CONSTRAINT));
    }

    #[tokio::test]
    async fn latest_scheduled_year_follows_year_codes() {
        let store = MemoryStore::new();
        let ay_2024 = store.add_academic_year(2024).await.unwrap();
        let ay_2026 = store.add_academic_year(2026).await.unwrap();
        let req = Uuid::new_v4();

        let mut unit = store.begin().await.unwrap();
        unit.insert_schedule(&new_schedule(req, ay_2026.id)).await.unwrap();
        unit.insert_schedule(&new_schedule(req, ay_2024.id)).await.unwrap();
        assert_eq!(unit.latest_scheduled_year_code(req).await.unwrap(), Some(2026));
        assert_eq!(unit.earliest_year_code().await.unwrap(), Some(2024));
        assert_eq!(
            unit.latest_scheduled_year_code(Uuid::new_v4()).await.unwrap(),
            None
        );
    }
}
