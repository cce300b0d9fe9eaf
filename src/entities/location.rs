use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repository::fields::{self, MappingError};
use crate::repository::{Slugged, TableEntity, Timestamps};
use crate::table::{Fields, Record};

pub const FIELD_NAME: &str = "Name";
pub const FIELD_SLUG: &str = "Slug";
pub const FIELD_STATUS: &str = "Status";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    #[default]
    Active,
    Inactive,
}

impl LocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationStatus::Active => "active",
            LocationStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(LocationStatus::Active),
            "inactive" => Ok(LocationStatus::Inactive),
            other => Err(format!("status must be 'active' or 'inactive', got '{other}'")),
        }
    }
}

/// A physical place served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub status: LocationStatus,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Location {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            slug: slug.into(),
            status: LocationStatus::default(),
            timestamps: Timestamps::default(),
        }
    }
}

impl TableEntity for Location {
    const KIND: &'static str = "location";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(FIELD_NAME.to_string(), Value::String(self.name.clone()));
        fields.insert(FIELD_SLUG.to_string(), Value::String(self.slug.clone()));
        fields.insert(FIELD_STATUS.to_string(), Value::String(self.status.as_str().to_string()));
        self.timestamps.write(&mut fields);
        fields
    }

    fn from_record(record: &Record) -> Result<Self, MappingError> {
        let status = fields::choice(record, FIELD_STATUS)?;
        let status = if status.is_empty() {
            LocationStatus::default()
        } else {
            status
                .parse()
                .map_err(|_| MappingError::new(record, FIELD_STATUS, "'active' or 'inactive'"))?
        };

        Ok(Self {
            id: record.id.clone(),
            name: fields::text(record, FIELD_NAME)?,
            slug: fields::text(record, FIELD_SLUG)?,
            status,
            timestamps: Timestamps::read(record),
        })
    }
}

impl Slugged for Location {
    fn build(name: String, slug: String) -> Self {
        Self::new(name, slug)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }

    fn set_status(&mut self, status: &str) -> Result<(), String> {
        self.status = status.parse()?;
        Ok(())
    }
}
