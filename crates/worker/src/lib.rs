//! certtrack background worker: periodic scheduling jobs and notification
//! routing.

pub mod config;
pub mod jobs;
