//! Event bus and notification delivery for certtrack.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`]: the event envelope published after a mutation commits.
//! - [`NotificationRouter`]: turns schedule events into persisted in-app
//!   notifications and fans out LINE pushes.
//! - [`delivery`]: external delivery channels.

pub mod bus;
pub mod delivery;
pub mod router;

pub use bus::{DomainEvent, EventBus};
pub use delivery::line::{LineConfig, LinePushDelivery};
pub use router::NotificationRouter;
