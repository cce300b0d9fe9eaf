pub mod accounts;
pub mod catalog;
pub mod mailer;

use std::collections::HashMap;

use thiserror::Error;

use crate::auth::{PasswordError, TokenError};
use crate::repository::RepositoryError;

pub use accounts::{Accounts, TokenResponse, UserUpdate, VerifyOutcome};
pub use catalog::{Catalog, CatalogUpdate};
pub use mailer::{verification_link, LogMailer, MailError, Mailer};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<HashMap<String, String>>,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid_field(field: &str, problem: impl Into<String>) -> Self {
        let mut details = HashMap::new();
        details.insert(field.to_string(), problem.into());
        ServiceError::Validation {
            message: "Invalid request data".to_string(),
            details: Some(details),
        }
    }
}

/// "job-category" -> "Job category"
pub(crate) fn kind_label(kind: &str) -> String {
    let spaced = kind.replace('-', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_label() {
        assert_eq!(kind_label("location"), "Location");
        assert_eq!(kind_label("job-category"), "Job category");
    }

    #[test]
    fn test_messages() {
        assert_eq!(ServiceError::NotFound("Location".to_string()).to_string(), "Location not found");
        let err = ServiceError::invalid_field("password", "must be at least 6 characters");
        assert_eq!(err.to_string(), "Invalid request data");
    }
}
