//! Configuration management for Lambda functions.

use std::env;

use crate::{Error, Result};

/// Members allowed on a single event unless `EVENT_MEMBER_LIMIT` says otherwise.
pub const DEFAULT_MEMBER_LIMIT: usize = 10;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database host
    pub db_host: String,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: String,
    /// AWS region
    pub aws_region: String,
    /// Maximum number of members per event
    pub member_limit: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            db_host: required("DATABASE_HOST")?,
            db_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "calendar".to_string()),
            db_secret_arn: required("DATABASE_URL_SECRET_ARN")?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            member_limit: parse_member_limit(env::var("EVENT_MEMBER_LIMIT").ok().as_deref())?,
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} not set", name)))
}

fn parse_member_limit(raw: Option<&str>) -> Result<usize> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_MEMBER_LIMIT),
        Some(value) => match value.parse::<usize>() {
            Ok(0) | Err(_) => Err(Error::Config(format!(
                "EVENT_MEMBER_LIMIT must be a positive integer, got `{}`",
                value
            ))),
            Ok(limit) => Ok(limit),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_limit_defaults_to_ten() {
        assert_eq!(parse_member_limit(None).unwrap(), 10);
        assert_eq!(parse_member_limit(Some("  ")).unwrap(), 10);
    }

    #[test]
    fn test_member_limit_rejects_garbage() {
        assert_eq!(parse_member_limit(Some("25")).unwrap(), 25);
        assert!(parse_member_limit(Some("0")).is_err());
        assert!(parse_member_limit(Some("ten")).is_err());
    }
}
