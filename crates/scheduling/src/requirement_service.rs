//! Program requirement lifecycle: create, update, archive.

use std::sync::Arc;

use certtrack_core::context::RequestContext;
use certtrack_core::error::CoreError;
use certtrack_core::requirement::{archived_until_year, validate_effective_from};
use certtrack_core::types::DbId;
use certtrack_db::models::program::Program;
use certtrack_db::models::program_requirement::{
    CreateProgramRequirement, ProgramRequirement, UpdateProgramRequirement,
};
use certtrack_db::models::status::{RecurrenceType, StatusId};
use certtrack_events::bus::{entity_types, event_types, DomainEvent};
use certtrack_events::EventBus;
use validator::Validate;

use crate::config::SchedulingConfig;
use crate::store::{SchedulingStore, SchedulingUnit, StoreError, REQUIREMENT_KEY_CONSTRAINT};

pub struct RequirementService<S> {
    store: S,
    config: SchedulingConfig,
    events: Option<Arc<EventBus>>,
}

impl<S: SchedulingStore> RequirementService<S> {
    pub fn new(store: S, config: SchedulingConfig) -> Self {
        Self {
            store,
            config,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Create a requirement for an active program and certificate type.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: &CreateProgramRequirement,
    ) -> Result<ProgramRequirement, CoreError> {
        input.validate()?;
        check_recurrence_type(input.recurrence_type_id)?;

        let mut unit = self.store.begin().await?;
        let program = active_program(&mut unit, input.program_id).await?;
        active_certificate_type(&mut unit, input.certificate_type_id).await?;
        input.shape().validate(program.duration_years)?;

        let requirement = unit
            .insert_requirement(input)
            .await
            .map_err(map_key_violation)?;
        unit.commit().await?;

        tracing::info!(
            program_requirement_id = %requirement.id,
            program_id = %requirement.program_id,
            target_year = requirement.target_year,
            request_id = %ctx.request_id,
            "Program requirement created"
        );
        self.publish(event_types::REQUIREMENT_CREATED, ctx, &requirement);
        Ok(requirement)
    }

    /// Apply a partial update and re-validate the merged requirement.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: DbId,
        input: &UpdateProgramRequirement,
    ) -> Result<ProgramRequirement, CoreError> {
        input.validate()?;
        check_recurrence_type(input.recurrence_type_id)?;

        let mut unit = self.store.begin().await?;
        let current = find_requirement(&mut unit, id).await?;
        if !current.is_active {
            return Err(CoreError::Inactive {
                entity: entity_types::REQUIREMENT,
                id,
            });
        }
        let program = active_program(&mut unit, current.program_id).await?;
        active_certificate_type(&mut unit, current.certificate_type_id).await?;

        let shape = input.merged_shape(&current);
        shape.validate(program.duration_years)?;

        let earliest = unit.earliest_year_code().await?;
        validate_effective_from(shape.effective_from_year, earliest)?;

        if input.effective_until_year.is_some() {
            let latest = unit.latest_scheduled_year_code(id).await?;
            self.config
                .until_rule
                .check(input.effective_until_year, latest)?;
        }

        let requirement = unit
            .update_requirement(id, input)
            .await
            .map_err(map_key_violation)?
            .ok_or(CoreError::NotFound {
                entity: entity_types::REQUIREMENT,
                id,
            })?;
        unit.commit().await?;

        tracing::info!(
            program_requirement_id = %id,
            request_id = %ctx.request_id,
            "Program requirement updated"
        );
        self.publish(event_types::REQUIREMENT_UPDATED, ctx, &requirement);
        Ok(requirement)
    }

    /// Deactivate a requirement, clamping `effective_until_year` down to the
    /// latest academic year that has a schedule.
    pub async fn archive(
        &self,
        ctx: &RequestContext,
        id: DbId,
    ) -> Result<ProgramRequirement, CoreError> {
        let mut unit = self.store.begin().await?;
        let current = find_requirement(&mut unit, id).await?;
        if !current.is_active {
            return Err(CoreError::AlreadyArchived(id));
        }

        let latest = unit.latest_scheduled_year_code(id).await?;
        let until = archived_until_year(current.effective_until_year, latest);

        let requirement = unit
            .archive_requirement(id, until)
            .await?
            .ok_or(CoreError::NotFound {
                entity: entity_types::REQUIREMENT,
                id,
            })?;
        unit.commit().await?;

        tracing::info!(
            program_requirement_id = %id,
            effective_until_year = ?requirement.effective_until_year,
            request_id = %ctx.request_id,
            "Program requirement archived"
        );
        self.publish(event_types::REQUIREMENT_ARCHIVED, ctx, &requirement);
        Ok(requirement)
    }

    fn publish(&self, event_type: &str, ctx: &RequestContext, requirement: &ProgramRequirement) {
        let Some(bus) = &self.events else {
            return;
        };
        bus.publish(
            DomainEvent::new(event_type)
                .with_source(entity_types::REQUIREMENT, requirement.id)
                .with_context(ctx)
                .with_payload(requirement.to_transport().to_json()),
        );
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

async fn find_requirement<U: SchedulingUnit>(
    unit: &mut U,
    id: DbId,
) -> Result<ProgramRequirement, CoreError> {
    unit.requirement(id).await?.ok_or(CoreError::NotFound {
        entity: entity_types::REQUIREMENT,
        id,
    })
}

async fn active_program<U: SchedulingUnit>(unit: &mut U, id: DbId) -> Result<Program, CoreError> {
    let program = unit
        .program(id)
        .await?
        .ok_or(CoreError::NotFound { entity: "program", id })?;
    if !program.is_active {
        return Err(CoreError::Inactive { entity: "program", id });
    }
    Ok(program)
}

async fn active_certificate_type<U: SchedulingUnit>(
    unit: &mut U,
    id: DbId,
) -> Result<(), CoreError> {
    let certificate_type = unit.certificate_type(id).await?.ok_or(CoreError::NotFound {
        entity: "certificate_type",
        id,
    })?;
    if !certificate_type.is_active {
        return Err(CoreError::Inactive {
            entity: "certificate_type",
            id,
        });
    }
    Ok(())
}

fn check_recurrence_type(id: Option<StatusId>) -> Result<(), CoreError> {
    match id {
        Some(id) if RecurrenceType::from_id(id).is_none() => Err(CoreError::Validation(format!(
            "recurrence_type_id {id} is not a known recurrence type"
        ))),
        _ => Ok(()),
    }
}

fn map_key_violation(err: StoreError) -> CoreError {
    match err.unique_constraint() {
        Some(REQUIREMENT_KEY_CONSTRAINT) => CoreError::DuplicateRequirement,
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unknown_recurrence_type_is_rejected() {
        assert!(check_recurrence_type(None).is_ok());
        assert!(check_recurrence_type(Some(RecurrenceType::Once.id())).is_ok());
        assert_matches!(check_recurrence_type(Some(9)), Err(CoreError::Validation(_)));
    }

    #[test]
    fn key_violation_maps_to_duplicate_requirement() {
        let err = StoreError::UniqueViolation {
            constraint: REQUIREMENT_KEY_CONSTRAINT.to_string(),
        };
        assert_matches!(map_key_violation(err), CoreError::DuplicateRequirement);

        let other = StoreError::UniqueViolation {
            constraint: "uq_programs_code".to_string(),
        };
        assert_matches!(map_key_violation(other), CoreError::OperationFailed(_));
    }
}
