//! Program requirement and schedule services.
//!
//! [`ScheduleService`] derives schedules from requirements; the
//! [`RequirementService`] manages the requirements themselves. Both run over
//! a [`SchedulingStore`]: [`PgSchedulingStore`] in production,
//! [`MemoryStore`] in tests.

pub mod config;
pub mod memory;
pub mod pg;
pub mod requirement_service;
pub mod schedule_service;
pub mod store;

pub use config::SchedulingConfig;
pub use memory::MemoryStore;
pub use pg::PgSchedulingStore;
pub use requirement_service::RequirementService;
pub use schedule_service::ScheduleService;
pub use store::{SchedulingStore, SchedulingUnit, StoreError};
