//! Error types for the calendar Lambda functions.

use thiserror::Error;
use uuid::Uuid;

use crate::forms::FormError;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the calendar Lambda functions.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The `month` query parameter is not of the form `YYYY-M`
    #[error("Malformed month parameter: {0}")]
    MalformedMonth(String),

    /// Event form rejected
    #[error("Validation error: {0}")]
    Form(#[from] FormError),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// The event already holds the maximum number of members
    #[error("Event {event_id} already has {limit} members")]
    MemberLimitExceeded { event_id: Uuid, limit: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MalformedMonth(_) | Error::Form(_) => 400,
            Error::Auth(_) => 401,
            Error::NotFound(_) => 404,
            Error::MemberLimitExceeded { .. } => 409,
            _ => 500,
        }
    }
}
