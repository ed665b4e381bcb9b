//! Caller identity from the API Gateway Cognito authorizer.

use crate::{Error, Result};

/// Identity of the caller as asserted by the authorizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Cognito subject
    pub subject: String,
    /// User's email
    pub email: Option<String>,
}

/// Extract the caller from the authorizer's `claims` object.
///
/// API Gateway has already validated the token; this only reads the claims.
pub fn extract_user_from_claims(claims: &serde_json::Value) -> Result<AuthenticatedUser> {
    let subject = claims
        .get("sub")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Auth("Missing sub claim".to_string()))?;

    let email = claims
        .get("email")
        .and_then(|v| v.as_str())
        .or_else(|| claims.get("cognito:username").and_then(|v| v.as_str()))
        .map(String::from);

    Ok(AuthenticatedUser {
        subject: subject.to_string(),
        email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_user() {
        let claims = serde_json::json!({
            "sub": "0f8c-user",
            "cognito:username": "ada",
        });
        let user = extract_user_from_claims(&claims).unwrap();
        assert_eq!(user.subject, "0f8c-user");
        assert_eq!(user.email.as_deref(), Some("ada"));
    }

    #[test]
    fn test_missing_sub() {
        let err = extract_user_from_claims(&serde_json::json!({"email": "a@b.c"})).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        let err = extract_user_from_claims(&serde_json::json!({"sub": ""})).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
