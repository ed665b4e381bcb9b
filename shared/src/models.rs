//! Shared data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub cognito_sub: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl Account {
    /// Name shown on the calendar header.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// A stored calendar event.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// True when `now` falls inside the event's interval, bounds included.
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    /// The fields a copy of this event would be created from.
    pub fn to_new(&self) -> NewEvent {
        NewEvent {
            owner_id: self.owner_id,
            fields: EventFields {
                title: self.title.clone(),
                description: self.description.clone(),
                start_time: self.start_time,
                end_time: self.end_time,
            },
        }
    }
}

/// Editable part of an event, produced by form validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// An event that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub owner_id: Uuid,
    pub fields: EventFields,
}

/// Association between an event and a member account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct EventMember {
    pub id: Uuid,
    pub event_id: Uuid,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Display record consumed by the front-end calendar widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start: String,
    pub end: String,
}

/// Timestamp layout expected by the calendar widget, e.g. `2020-09-16T16:00:00`.
pub const WIDGET_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl From<&Event> for EventView {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.to_string(),
            title: event.title.clone(),
            description: event.description.clone(),
            start: event.start_time.format(WIDGET_TIME_FORMAT).to_string(),
            end: event.end_time.format(WIDGET_TIME_FORMAT).to_string(),
        }
    }
}
