use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors from the remote table service. Nothing here is retried.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid remote table URL: {0}")]
    InvalidUrl(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Bulk delete accepts at most {max} records, got {got}")]
    TooManyRecords { max: usize, got: usize },

    #[error("Remote table service returned {status} ({kind}): {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl TableError {
    /// Builds an error from a non-success response body.
    ///
    /// The service answers either `{"error": {"type": .., "message": ..}}` or
    /// `{"error": "NOT_FOUND"}`; anything else is kept as raw text.
    pub(crate) fn from_response(status: StatusCode, body: &str, subject: &str) -> Self {
        if status == StatusCode::NOT_FOUND {
            return TableError::NotFound(subject.to_string());
        }

        let (kind, message) = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => match map.get("error") {
                Some(Value::Object(err)) => (
                    err.get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("UNKNOWN")
                        .to_string(),
                    err.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                ),
                Some(Value::String(kind)) => (kind.clone(), String::new()),
                _ => ("UNKNOWN".to_string(), body.to_string()),
            },
            _ => ("UNKNOWN".to_string(), body.to_string()),
        };

        TableError::Api {
            status: status.as_u16(),
            kind,
            message,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TableError::NotFound(_))
    }
}
