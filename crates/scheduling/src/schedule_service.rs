//! Schedule derivation service.
//!
//! Turns a (program requirement, academic year) pair plus a submission
//! deadline into a persisted schedule. Both operations run as one unit of
//! work and validate in a fixed order:
//!
//! 1. requirement exists and is active
//! 2. academic year exists
//! 3. owning program and certificate type exist and are active
//! 4. target year fits the program duration
//! 5. deadline lies inside the program window
//! 6. no other schedule exists for the pair
//!
//! The store's unique constraint is the final arbiter for step 6; a
//! violation that slips past the lookup is reported the same way.

use std::sync::Arc;

use certtrack_core::context::RequestContext;
use certtrack_core::error::CoreError;
use certtrack_core::requirement::validate_target_year;
use certtrack_core::schedule::{check_deadline_window, DerivedDeadlines, LeadTimes};
use certtrack_core::types::DbId;
use certtrack_db::models::schedule::{NewSchedule, Schedule, ScheduleRequest};
use certtrack_events::bus::{entity_types, event_types, DomainEvent};
use certtrack_events::EventBus;

use crate::config::SchedulingConfig;
use crate::store::{SchedulingStore, SchedulingUnit, StoreError, SCHEDULE_PAIR_CONSTRAINT};

pub struct ScheduleService<S> {
    store: S,
    config: SchedulingConfig,
    events: Option<Arc<EventBus>>,
}

impl<S: SchedulingStore> ScheduleService<S> {
    pub fn new(store: S, config: SchedulingConfig) -> Self {
        Self {
            store,
            config,
            events: None,
        }
    }

    /// Publish `schedule.created` / `schedule.updated` after each commit.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Derive and persist the schedule for a new (requirement, year) pair.
    pub async fn derive_and_create(
        &self,
        ctx: &RequestContext,
        request: &ScheduleRequest,
    ) -> Result<Schedule, CoreError> {
        let mut unit = self.store.begin().await?;
        let derived = self.derive(&mut unit, request).await?;

        if unit
            .schedule_for_pair(request.program_requirement_id, request.academic_year_id)
            .await?
            .is_some()
        {
            return Err(duplicate(request));
        }

        let schedule = unit
            .insert_schedule(&derived)
            .await
            .map_err(|e| map_pair_violation(e, request))?;
        unit.commit().await?;

        tracing::info!(
            schedule_id = %schedule.id,
            program_requirement_id = %schedule.program_requirement_id,
            academic_year_id = %schedule.academic_year_id,
            request_id = %ctx.request_id,
            "Schedule created"
        );
        self.publish(event_types::SCHEDULE_CREATED, ctx, &schedule);
        Ok(schedule)
    }

    /// Re-derive an existing schedule in place.
    ///
    /// The owning requirement cannot change; the academic year can, as long
    /// as the requirement has no other schedule in the new year.
    pub async fn derive_and_update(
        &self,
        ctx: &RequestContext,
        schedule_id: DbId,
        request: &ScheduleRequest,
    ) -> Result<Schedule, CoreError> {
        let mut unit = self.store.begin().await?;
        let current = unit
            .schedule(schedule_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: entity_types::SCHEDULE,
                id: schedule_id,
            })?;
        if current.program_requirement_id != request.program_requirement_id {
            return Err(CoreError::ImmutableLink);
        }

        let derived = self.derive(&mut unit, request).await?;

        if let Some(other) = unit
            .schedule_for_pair(request.program_requirement_id, request.academic_year_id)
            .await?
        {
            if other.id != schedule_id {
                return Err(duplicate(request));
            }
        }

        let schedule = unit
            .update_schedule(schedule_id, &derived)
            .await
            .map_err(|e| map_pair_violation(e, request))?
            .ok_or(CoreError::NotFound {
                entity: entity_types::SCHEDULE,
                id: schedule_id,
            })?;
        unit.commit().await?;

        tracing::info!(
            schedule_id = %schedule.id,
            academic_year_id = %schedule.academic_year_id,
            request_id = %ctx.request_id,
            "Schedule updated"
        );
        self.publish(event_types::SCHEDULE_UPDATED, ctx, &schedule);
        Ok(schedule)
    }

    /// Steps 1-5: validate the request and compute the schedule row.
    async fn derive(
        &self,
        unit: &mut S::Unit,
        request: &ScheduleRequest,
    ) -> Result<NewSchedule, CoreError> {
        let requirement = unit
            .requirement(request.program_requirement_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: entity_types::REQUIREMENT,
                id: request.program_requirement_id,
            })?;
        if !requirement.is_active {
            return Err(CoreError::Inactive {
                entity: entity_types::REQUIREMENT,
                id: requirement.id,
            });
        }

        let academic_year = unit
            .academic_year(request.academic_year_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "academic_year",
                id: request.academic_year_id,
            })?;

        let program = unit
            .program(requirement.program_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "program",
                id: requirement.program_id,
            })?;
        if !program.is_active {
            return Err(CoreError::Inactive {
                entity: "program",
                id: program.id,
            });
        }

        let certificate_type = unit
            .certificate_type(requirement.certificate_type_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "certificate_type",
                id: requirement.certificate_type_id,
            })?;
        if !certificate_type.is_active {
            return Err(CoreError::Inactive {
                entity: "certificate_type",
                id: certificate_type.id,
            });
        }

        validate_target_year(requirement.target_year, program.duration_years)?;
        check_deadline_window(
            request.submission_deadline,
            academic_year.start_date,
            program.duration_years,
            self.config.window,
        )?;

        let lead = LeadTimes::resolve(
            request.grace_period_days,
            request.notification_days_before_deadline,
            requirement.grace_period_days,
            requirement.notification_days_before_deadline,
        )?;
        let derived = DerivedDeadlines::derive(request.submission_deadline, lead)?;
        Ok(NewSchedule::new(requirement.id, academic_year.id, derived))
    }

    fn publish(&self, event_type: &str, ctx: &RequestContext, schedule: &Schedule) {
        let Some(bus) = &self.events else {
            return;
        };
        bus.publish(
            DomainEvent::new(event_type)
                .with_source(entity_types::SCHEDULE, schedule.id)
                .with_context(ctx)
                .with_payload(schedule.to_transport().to_json()),
        );
    }
}

fn duplicate(request: &ScheduleRequest) -> CoreError {
    CoreError::DuplicateSchedule {
        requirement_id: request.program_requirement_id,
        academic_year_id: request.academic_year_id,
    }
}

fn map_pair_violation(err: StoreError, request: &ScheduleRequest) -> CoreError {
    match err.unique_constraint() {
        Some(SCHEDULE_PAIR_CONSTRAINT) => duplicate(request),
        _ => err.into(),
    }
}
