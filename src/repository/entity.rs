use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::{Fields, Record};

use super::fields::{self, MappingError};

/// A typed row that can be written to and read back from a remote table.
pub trait TableEntity: Clone + Send + Sync + 'static {
    /// Singular lowercase name, used in messages and as the fallback slug base.
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    fn timestamps(&self) -> &Timestamps;
    fn timestamps_mut(&mut self) -> &mut Timestamps;

    /// Field map keyed by display name. Includes the timestamp columns.
    fn to_fields(&self) -> Fields;

    /// Missing keys read as zero values; a present key of the wrong type fails.
    fn from_record(record: &Record) -> Result<Self, MappingError>;

    /// Current text of `field` on this entity, for equality filtering in the
    /// local store. `None` when the entity has no such column.
    fn field_text(&self, field: &str) -> Option<String> {
        self.to_fields().get(field).and_then(crate::table::value_as_text)
    }
}

/// Entity addressed by a unique, URL-safe slug.
pub trait Slugged: TableEntity {
    const NAME_FIELD: &'static str = "Name";
    const SLUG_FIELD: &'static str = "Slug";

    fn build(name: String, slug: String) -> Self;

    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);

    fn slug(&self) -> &str;
    fn set_slug(&mut self, slug: String);

    /// Applies a status change. Entities without a status column reject it.
    fn set_status(&mut self, status: &str) -> Result<(), String> {
        Err(format!("{} has no status (got '{}')", Self::KIND, status))
    }
}

/// `Created At` / `Updated At` columns, stamped with the local clock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Timestamps {
    pub const CREATED_AT: &'static str = "Created At";
    pub const UPDATED_AT: &'static str = "Updated At";

    pub fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }

    pub fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    pub fn write(&self, fields: &mut Fields) {
        if let Some(at) = self.created_at {
            fields.insert(Self::CREATED_AT.to_string(), Value::String(rfc3339(at)));
        }
        if let Some(at) = self.updated_at {
            fields.insert(Self::UPDATED_AT.to_string(), Value::String(rfc3339(at)));
        }
    }

    /// Unparseable timestamps read as absent rather than failing the record.
    pub fn read(record: &Record) -> Self {
        Self {
            created_at: fields::timestamp(record, Self::CREATED_AT),
            updated_at: fields::timestamp(record, Self::UPDATED_AT),
        }
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
