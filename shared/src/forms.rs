//! Request body validation for event and member forms.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::models::EventFields;

/// Why an event form was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("title must be between 1 and 200 characters")]
    Title,

    #[error("description must be at most 2000 characters")]
    Description,

    #[error("{field} is not a valid timestamp")]
    InvalidTimestamp { field: &'static str },

    #[error("end_time must not be before start_time")]
    EndBeforeStart,
}

/// Event create/edit body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventForm {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    pub start_time: String,
    pub end_time: String,
}

impl EventForm {
    /// Check the form and convert it into storable fields.
    pub fn into_fields(self) -> Result<EventFields, FormError> {
        if let Err(errors) = self.validate() {
            let fields = errors.field_errors();
            if fields.contains_key("title") {
                return Err(FormError::Title);
            }
            if fields.contains_key("description") {
                return Err(FormError::Description);
            }
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::Title);
        }

        let start_time = parse_timestamp(&self.start_time)
            .ok_or(FormError::InvalidTimestamp { field: "start_time" })?;
        let end_time = parse_timestamp(&self.end_time)
            .ok_or(FormError::InvalidTimestamp { field: "end_time" })?;
        if end_time < start_time {
            return Err(FormError::EndBeforeStart);
        }

        Ok(EventFields {
            title: title.to_string(),
            description: self.description,
            start_time,
            end_time,
        })
    }
}

/// Add-member body.
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberForm {
    pub user_id: Uuid,
}

/// Accepts RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` read as UTC
/// (what an HTML `datetime-local` input submits).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn form(title: &str, start: &str, end: &str) -> EventForm {
        EventForm {
            title: title.to_string(),
            description: "Quarterly review".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let fields = form("  Review ", "2024-03-01T09:00", "2024-03-01T10:30:00Z")
            .into_fields()
            .unwrap();
        assert_eq!(fields.title, "Review");
        assert_eq!(fields.start_time, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        assert_eq!(fields.end_time, Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_rejects_blank_and_long_titles() {
        let start = "2024-03-01T09:00";
        assert_eq!(form("", start, start).into_fields(), Err(FormError::Title));
        assert_eq!(form("   ", start, start).into_fields(), Err(FormError::Title));
        let long = "x".repeat(201);
        assert_eq!(form(&long, start, start).into_fields(), Err(FormError::Title));
    }

    #[test]
    fn test_rejects_long_description() {
        let mut f = form("Review", "2024-03-01T09:00", "2024-03-01T10:00");
        f.description = "d".repeat(2001);
        assert_eq!(f.into_fields(), Err(FormError::Description));
    }

    #[test]
    fn test_rejects_bad_timestamps() {
        assert_eq!(
            form("Review", "tomorrow", "2024-03-01T10:00").into_fields(),
            Err(FormError::InvalidTimestamp { field: "start_time" })
        );
        assert_eq!(
            form("Review", "2024-03-01T09:00", "2024-13-01T10:00").into_fields(),
            Err(FormError::InvalidTimestamp { field: "end_time" })
        );
    }

    #[test]
    fn test_rejects_end_before_start() {
        assert_eq!(
            form("Review", "2024-03-01T10:00", "2024-03-01T09:00").into_fields(),
            Err(FormError::EndBeforeStart)
        );
        assert!(form("Review", "2024-03-01T10:00", "2024-03-01T10:00")
            .into_fields()
            .is_ok());
    }

    #[test]
    fn test_parse_timestamp_offsets() {
        assert_eq!(
            parse_timestamp("2024-03-01T11:00:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(""), None);
    }
}
