use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repository::fields::{self, MappingError};
use crate::repository::{Slugged, TableEntity, Timestamps};
use crate::table::{Fields, Record};

use super::location::{FIELD_NAME, FIELD_SLUG};

/// Marker naming one kind of name/slug catalog entry.
pub trait NamedKind: Send + Sync + 'static {
    const KIND: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobCategoryKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTypeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductGroupKind;

impl NamedKind for JobCategoryKind {
    const KIND: &'static str = "job-category";
}

impl NamedKind for JobTypeKind {
    const KIND: &'static str = "job-type";
}

impl NamedKind for ProductGroupKind {
    const KIND: &'static str = "product-group";
}

pub type JobCategory = Named<JobCategoryKind>;
pub type JobType = Named<JobTypeKind>;
pub type ProductGroup = Named<ProductGroupKind>;

/// Catalog entry that is just a name and a slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Named<K> {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K: NamedKind> Named<K> {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            slug: slug.into(),
            timestamps: Timestamps::default(),
            kind: PhantomData,
        }
    }
}

impl<K: NamedKind + Clone> TableEntity for Named<K> {
    const KIND: &'static str = K::KIND;

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
        self.timestamps.write(&mut fields);
        fields
    }

    fn from_record(record: &Record) -> Result<Self, MappingError> {
        Ok(Self {
            id: record.id.clone(),
            name: fields::text(record, FIELD_NAME)?,
            slug: fields::text(record, FIELD_SLUG)?,
            timestamps: Timestamps::read(record),
            kind: PhantomData,
        })
    }
}

impl<K: NamedKind + Clone> Slugged for Named<K> {
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
}
