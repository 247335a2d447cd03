use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use evently_core::{DomainError, DomainResult, Entity, EventId, UserId};

/// The full, validated set of caller-editable event fields.
///
/// Used by create and full update. Every text field must be non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_time: DateTime<Utc>,
}

impl EventDetails {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        date_time: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let details = Self {
            name: name.into(),
            description: description.into(),
            location: location.into(),
            date_time,
        };
        details.validate()?;
        Ok(details)
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("description", &self.description)?;
        require_text("location", &self.location)?;
        Ok(())
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// A persisted event.
///
/// `id` and `owner_user_id` are fixed at creation; only the [`EventDetails`]
/// part ever changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_time: DateTime<Utc>,
    pub owner_user_id: UserId,
}

impl Event {
    pub fn new(id: EventId, owner_user_id: UserId, details: EventDetails) -> Self {
        Self {
            id,
            name: details.name,
            description: details.description,
            location: details.location,
            date_time: details.date_time,
            owner_user_id,
        }
    }

    /// Full update: replaces every editable field, keeps id and owner.
    pub fn replace_details(&mut self, details: EventDetails) {
        self.name = details.name;
        self.description = details.description;
        self.location = details.location;
        self.date_time = details.date_time;
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
