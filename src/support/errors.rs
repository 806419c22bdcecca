use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Field-level rejection of an input value.
    #[error("Validation: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Login rejected. The message never distinguishes an unknown
    /// account from a wrong password.
    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_the_field() {
        let err = DomainError::validation("username", "A user with that username already exists.");
        assert_eq!(
            err.to_string(),
            "Validation: username: A user with that username already exists."
        );
    }

    #[test]
    fn credential_failures_share_one_message() {
        assert_eq!(
            DomainError::InvalidCredentials.to_string(),
            "No active account found with the given credentials"
        );
    }
}
