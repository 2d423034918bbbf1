//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`DomainEvent`]s. Share it
//! via `Arc<EventBus>`; publishing never blocks and never fails the caller.

use certtrack_core::context::RequestContext;
use certtrack_core::types::DbId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event type names published by the scheduling services and jobs.
pub mod event_types {
    pub const SCHEDULE_CREATED: &str = "schedule.created";
    pub const SCHEDULE_UPDATED: &str = "schedule.updated";
    /// Payload carries `kind`: `remind`, `warn`, `late` or `overdue`.
    pub const SCHEDULE_REMINDER: &str = "schedule.reminder";
    pub const REQUIREMENT_CREATED: &str = "requirement.created";
    pub const REQUIREMENT_UPDATED: &str = "requirement.updated";
    pub const REQUIREMENT_ARCHIVED: &str = "requirement.archived";
}

/// Source entity kinds recorded on events and notifications.
pub mod entity_types {
    pub const SCHEDULE: &str = "program_requirement_schedule";
    pub const REQUIREMENT: &str = "program_requirement";
}

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Something that happened to a schedule or requirement.
///
/// Built with [`DomainEvent::new`] and the `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"schedule.created"`.
    pub event_type: String,

    /// Source entity kind (`"program_requirement_schedule"`, ...).
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// Request id and actor of the operation that raised the event.
    pub context: Option<RequestContext>,

    /// camelCase JSON payload.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            context: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_context(mut self, context: &RequestContext) -> Self {
        self.context = Some(context.clone());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use certtrack_events::bus::{DomainEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DomainEvent::new("schedule.created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: DomainEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let schedule_id = Uuid::new_v4();
        let context = RequestContext::scheduled("planner");

        bus.publish(
            DomainEvent::new(event_types::SCHEDULE_CREATED)
                .with_source("program_requirement_schedule", schedule_id)
                .with_context(&context)
                .with_payload(serde_json::json!({"scheduleId": schedule_id})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "schedule.created");
        assert_eq!(
            received.source_entity_type.as_deref(),
            Some("program_requirement_schedule")
        );
        assert_eq!(received.source_entity_id, Some(schedule_id));
        assert_eq!(received.context, Some(context));
        assert_eq!(received.payload["scheduleId"], schedule_id.to_string());
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DomainEvent::new(event_types::REQUIREMENT_ARCHIVED));

        assert_eq!(rx1.recv().await.unwrap().event_type, "requirement.archived");
        assert_eq!(rx2.recv().await.unwrap().event_type, "requirement.archived");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(DomainEvent::new("orphan.event"));
    }

    #[test]
    fn new_event_has_empty_optional_fields() {
        let event = DomainEvent::new("bare.event");
        assert!(event.source_entity_type.is_none());
        assert!(event.source_entity_id.is_none());
        assert!(event.context.is_none());
        assert!(event.payload.is_object());
    }
}
