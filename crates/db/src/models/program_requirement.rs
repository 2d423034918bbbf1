//! Program requirement entity model and DTOs.

use certtrack_core::recurrence::RecurringRequirement;
use certtrack_core::requirement::RequirementShape;
use certtrack_core::transport::TransportValue;
use certtrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::status::{RecurrenceType, StatusId};

/// A row from the `program_requirements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProgramRequirement {
    pub id: DbId,
    pub program_id: DbId,
    pub certificate_type_id: DbId,
    pub name: String,
    pub target_year: i32,
    pub deadline_day: i32,
    pub deadline_month: i32,
    pub grace_period_days: i32,
    pub notification_days_before_deadline: i32,
    pub is_mandatory: bool,
    pub is_active: bool,
    pub special_instruction: Option<String>,
    pub recurrence_type_id: StatusId,
    pub effective_from_year: Option<i32>,
    pub effective_until_year: Option<i32>,
    pub months_before_deadline: Option<i32>,
    pub last_recurrence_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProgramRequirement {
    pub fn recurrence_type(&self) -> RecurrenceType {
        RecurrenceType::from_id(self.recurrence_type_id).unwrap_or_default()
    }

    pub fn shape(&self) -> RequirementShape {
        RequirementShape {
            target_year: self.target_year,
            deadline_day: self.deadline_day,
            deadline_month: self.deadline_month,
            effective_from_year: self.effective_from_year,
            effective_until_year: self.effective_until_year,
        }
    }

    /// Event payload describing this requirement.
    pub fn to_transport(&self) -> TransportValue {
        TransportValue::map()
            .field("program_requirement_id", self.id)
            .field("program_id", self.program_id)
            .field("certificate_type_id", self.certificate_type_id)
            .field("name", self.name.clone())
            .field("target_year", self.target_year)
            .field("is_active", self.is_active)
            .field("recurrence_type", TransportValue::Enum(self.recurrence_type().as_str()))
            .field("effective_from_year", self.effective_from_year)
            .field("effective_until_year", self.effective_until_year)
    }

    /// The fields the periodic planner reads.
    pub fn recurring(&self) -> RecurringRequirement {
        RecurringRequirement {
            target_year: self.target_year,
            deadline_day: self.deadline_day,
            deadline_month: self.deadline_month,
            months_before_deadline: self.months_before_deadline,
            effective_from_year: self.effective_from_year,
            effective_until_year: self.effective_until_year,
            is_one_off: self.recurrence_type() == RecurrenceType::Once,
            last_recurrence_at: self.last_recurrence_at,
        }
    }
}

/// DTO for creating a new program requirement.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProgramRequirement {
    pub program_id: DbId,
    pub certificate_type_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 1, max = 10))]
    pub target_year: i32,
    #[validate(range(min = 1, max = 31))]
    pub deadline_day: i32,
    #[validate(range(min = 1, max = 12))]
    pub deadline_month: i32,
    /// Defaults to 7 days if omitted.
    #[validate(range(min = 0, max = 365))]
    pub grace_period_days: Option<i32>,
    /// Defaults to 90 days if omitted.
    #[validate(range(min = 0, max = 365))]
    pub notification_days_before_deadline: Option<i32>,
    pub is_mandatory: Option<bool>,
    pub special_instruction: Option<String>,
    /// Defaults to annual if omitted.
    pub recurrence_type_id: Option<StatusId>,
    #[validate(range(min = 1900, max = 2100))]
    pub effective_from_year: Option<i32>,
    #[validate(range(min = 1900, max = 2100))]
    pub effective_until_year: Option<i32>,
    #[validate(range(min = 1, max = 6))]
    pub months_before_deadline: Option<i32>,
}

impl CreateProgramRequirement {
    pub fn shape(&self) -> RequirementShape {
        RequirementShape {
            target_year: self.target_year,
            deadline_day: self.deadline_day,
            deadline_month: self.deadline_month,
            effective_from_year: self.effective_from_year,
            effective_until_year: self.effective_until_year,
        }
    }
}

/// DTO for updating an existing program requirement. All fields are optional.
///
/// The owning program and certificate type are fixed at creation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProgramRequirement {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub target_year: Option<i32>,
    #[validate(range(min = 1, max = 31))]
    pub deadline_day: Option<i32>,
    #[validate(range(min = 1, max = 12))]
    pub deadline_month: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub grace_period_days: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub notification_days_before_deadline: Option<i32>,
    pub is_mandatory: Option<bool>,
    pub special_instruction: Option<String>,
    pub recurrence_type_id: Option<StatusId>,
    #[validate(range(min = 1900, max = 2100))]
    pub effective_from_year: Option<i32>,
    #[validate(range(min = 1900, max = 2100))]
    pub effective_until_year: Option<i32>,
    #[validate(range(min = 1, max = 6))]
    pub months_before_deadline: Option<i32>,
}

impl UpdateProgramRequirement {
    /// The shape `current` would have after this update.
    pub fn merged_shape(&self, current: &ProgramRequirement) -> RequirementShape {
        RequirementShape {
            target_year: self.target_year.unwrap_or(current.target_year),
            deadline_day: self.deadline_day.unwrap_or(current.deadline_day),
            deadline_month: self.deadline_month.unwrap_or(current.deadline_month),
            effective_from_year: self.effective_from_year.or(current.effective_from_year),
            effective_until_year: self.effective_until_year.or(current.effective_until_year),
        }
    }
}
