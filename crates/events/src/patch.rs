//! Partial updates over a closed set of event fields.
//!
//! A patch is decoded from a JSON object in one pass that checks *every* key
//! against [`EventField`] before any value is accepted, so a request carrying
//! a single foreign key produces no patch at all.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use evently_core::{DomainError, DomainResult};

use crate::event::{require_text, Event};

/// The fields a partial update may touch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventField {
    Name,
    Description,
    Location,
    DateTime,
}

impl EventField {
    pub const ALL: [EventField; 4] = [
        EventField::Name,
        EventField::Description,
        EventField::Location,
        EventField::DateTime,
    ];

    /// Key used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            EventField::Name => "name",
            EventField::Description => "description",
            EventField::Location => "location",
            EventField::DateTime => "dateTime",
        }
    }

    /// Storage column backing the field.
    pub const fn column(self) -> &'static str {
        match self {
            EventField::Name => "name",
            EventField::Description => "description",
            EventField::Location => "location",
            EventField::DateTime => "date_time",
        }
    }
}

impl core::fmt::Display for EventField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("field '{s}' cannot be updated")))
    }
}

/// A sparse set of field values; `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
}

impl EventPatch {
    /// Decode a patch from a JSON object.
    ///
    /// Fails with a validation error if any key is outside the allow-list or
    /// any value is of the wrong shape. Keys are checked first, all of them.
    pub fn from_json(body: &Map<String, Value>) -> DomainResult<Self> {
        for key in body.keys() {
            key.parse::<EventField>()?;
        }

        let mut patch = EventPatch::default();
        for (key, value) in body {
            let field = key.parse::<EventField>()?;
            match field {
                EventField::Name => patch.name = Some(text_value(field, value)?),
                EventField::Description => patch.description = Some(text_value(field, value)?),
                EventField::Location => patch.location = Some(text_value(field, value)?),
                EventField::DateTime => patch.date_time = Some(date_time_value(value)?),
            }
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Fields carried by this patch, in allow-list order.
    pub fn fields(&self) -> Vec<EventField> {
        EventField::ALL
            .into_iter()
            .filter(|field| match field {
                EventField::Name => self.name.is_some(),
                EventField::Description => self.description.is_some(),
                EventField::Location => self.location.is_some(),
                EventField::DateTime => self.date_time.is_some(),
            })
            .collect()
    }

    /// Merge into `event`. Absent fields keep their value; id and owner are
    /// never touched.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(name) = &self.name {
            event.name = name.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(date_time) = self.date_time {
            event.date_time = date_time;
        }
    }
}

fn text_value(field: EventField, value: &Value) -> DomainResult<String> {
    let Value::String(text) = value else {
        return Err(DomainError::validation(format!("{field} must be a string")));
    };
    require_text(field.as_str(), text)?;
    Ok(text.clone())
}

fn date_time_value(value: &Value) -> DomainResult<DateTime<Utc>> {
    let Value::String(text) = value else {
        return Err(DomainError::validation("dateTime must be an RFC 3339 string"));
    };
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::validation(format!("dateTime is invalid: {e}")))
}
