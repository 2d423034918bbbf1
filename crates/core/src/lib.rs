//! Domain logic for certificate-compliance tracking.
//!
//! Everything in this crate is pure: no database, no network, no clock
//! reads. Callers pass `now` and the rows they loaded, and get back derived
//! values or a [`CoreError`](error::CoreError).

pub mod academic_calendar;
pub mod channels;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod recurrence;
pub mod reminder;
pub mod requirement;
pub mod schedule;
pub mod templates;
pub mod transport;
pub mod types;
