//! Explicit per-operation request context.
//!
//! Every service operation receives a [`RequestContext`] from its caller and
//! copies it onto the events it publishes, so logs and notifications can be
//! correlated without any ambient state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::DbId;

/// Who initiated an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// A staff member acting through the admin portal.
    User(DbId),
    /// An internal component acting on its own behalf.
    System(String),
    /// A periodic job.
    Scheduled(String),
}

impl Actor {
    /// Wire name stored in `notifications.actor_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Actor::User(_) => "user",
            Actor::System(_) => "system",
            Actor::Scheduled(_) => "scheduled",
        }
    }

    /// The acting user, if a person triggered the operation.
    pub fn user_id(&self) -> Option<DbId> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::System(_) | Actor::Scheduled(_) => None,
        }
    }
}

/// Correlation data threaded through a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub actor: Actor,
}

impl RequestContext {
    /// Context for a staff action with a fresh request id.
    pub fn for_user(user_id: DbId) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor: Actor::User(user_id),
        }
    }

    /// Context for a periodic job run with a fresh request id.
    pub fn scheduled(job: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor: Actor::Scheduled(job.into()),
        }
    }

    /// Context for an internal component with a fresh request id.
    pub fn system(component: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor: Actor::System(component.into()),
        }
    }

    /// Keep the actor, but use an incoming request id.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_kinds_match_wire_names() {
        assert_eq!(Actor::User(Uuid::nil()).kind(), "user");
        assert_eq!(Actor::System("router".into()).kind(), "system");
        assert_eq!(Actor::Scheduled("planner".into()).kind(), "scheduled");
    }

    #[test]
    fn only_users_expose_an_id() {
        let id = Uuid::new_v4();
        assert_eq!(RequestContext::for_user(id).actor.user_id(), Some(id));
        assert_eq!(RequestContext::scheduled("planner").actor.user_id(), None);
    }

    #[test]
    fn each_context_gets_its_own_request_id() {
        let a = RequestContext::system("router");
        let b = RequestContext::system("router");
        assert_ne!(a.request_id, b.request_id);

        let fixed = Uuid::new_v4();
        assert_eq!(a.with_request_id(fixed).request_id, fixed);
    }
}
