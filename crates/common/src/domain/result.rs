use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{}: {}", self.field, self.error)
        }
    }
}

/// Reasons a caller could not be authenticated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("expected authorization header format: Bearer <token>")]
    InvalidAuthorizationHeader,

    #[error("token is missing the tenant id claim")]
    MissingTenantId,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error("no tenant in request context")]
    NoTenant,

    #[error("storage connection failed: {0}")]
    ConnectionFailed(anyhow::Error),

    /// State the process can no longer trust. Raising this asks the process
    /// to shut down instead of answering normally.
    #[error("integrity failure: {0}")]
    Shutdown(String),

    #[error("identity provider error: {0}")]
    IdentityProvider(String),

    #[error("repository error: {0}")]
    Repository(#[from] anyhow::Error),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, error)])
    }

    /// Integrity failure raised when request values are absent where they
    /// must be present.
    pub fn missing_request_values() -> Self {
        Self::Shutdown("request values missing from context".to_string())
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown(_))
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = DomainError::Validation(vec![
            FieldError::new("email", "not a valid email address"),
            FieldError::new("plan", "must be one of basic, premium"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: email: not a valid email address, plan: must be one of basic, premium"
        );
    }

    #[test]
    fn test_auth_error_is_transparent() {
        let err: DomainError = AuthError::MissingTenantId.into();
        assert_eq!(err.to_string(), "token is missing the tenant id claim");
    }
}
