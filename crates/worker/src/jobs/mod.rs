//! Periodic jobs hosted by the worker.
//!
//! Each job exposes `run(.., cancel)`: a `tokio::time::interval` loop that
//! performs one cycle per tick until the token is cancelled. Cycle failures
//! are logged and the loop carries on with the next tick.

pub mod deadline_notifier;
pub mod notification_expiry;
pub mod requirement_archiver;
pub mod schedule_planner;

use certtrack_core::error::CoreError;

/// Failure of a single item inside a job cycle.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
