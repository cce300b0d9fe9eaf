//! Transport to the hosted table service: `{id, fields}` records in named
//! tables inside one base, authenticated with a bearer API key.

pub mod client;
pub mod error;
pub mod formula;
pub mod record;

pub use client::{TableClient, MAX_BULK_DELETE};
pub use error::TableError;
pub use record::{value_as_text, Fields, ListParams, Record, SortDirection, SortParam};
