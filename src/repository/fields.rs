// Tolerant readers for the generic field map. Absent and null keys read as
// zero values; a key holding the wrong JSON type is a mapping error.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::table::Record;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("record {id}: field '{field}' should be {expected}")]
pub struct MappingError {
    pub id: String,
    pub field: String,
    pub expected: &'static str,
}

impl MappingError {
    pub fn new(record: &Record, field: &str, expected: &'static str) -> Self {
        Self {
            id: record.id.clone(),
            field: field.to_string(),
            expected,
        }
    }
}

pub fn text(record: &Record, field: &str) -> Result<String, MappingError> {
    match record.fields.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(MappingError::new(record, field, "text")),
    }
}

/// Text column that may also come back as a single-select list.
pub fn choice(record: &Record, field: &str) -> Result<String, MappingError> {
    match record.fields.get(field) {
        Some(Value::Array(items)) => match items.first() {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(MappingError::new(record, field, "text")),
        },
        _ => text(record, field),
    }
}

pub fn timestamp(record: &Record, field: &str) -> Option<DateTime<Utc>> {
    record
        .fields
        .get(field)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|at| at.with_timezone(&Utc))
}
