use serde::{Deserialize, Serialize};

use evently_core::{EventId, UserId};

/// "User is signed up for event."
///
/// The pair is the whole record: existence is the only state, and at most one
/// registration exists per `(event_id, user_id)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub event_id: EventId,
    pub user_id: UserId,
}

impl Registration {
    pub const fn new(event_id: EventId, user_id: UserId) -> Self {
        Self { event_id, user_id }
    }
}
