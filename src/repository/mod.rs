//! Typed access to entity tables.
//!
//! Every entity goes through one [`Repository`] implementation chosen at
//! startup from [`StorageMode`]: remote only, process-local only, or a local
//! store mirrored to the remote service.

pub mod entity;
pub mod fields;
pub mod memory;
pub mod mirrored;
pub mod remote;
pub mod slug;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::StorageMode;
use crate::table::{TableClient, TableError};

pub use entity::{Slugged, TableEntity, Timestamps};
pub use fields::MappingError;
pub use memory::MemoryRepository;
pub use mirrored::MirroredRepository;
pub use remote::RemoteRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

#[async_trait]
pub trait Repository<E: TableEntity>: Send + Sync {
    /// All rows. Never fails: transport errors degrade to an empty (or local) list
    /// and rows that cannot be mapped are skipped with a warning.
    async fn list(&self) -> Vec<E>;

    async fn get(&self, id: &str) -> Result<Option<E>, RepositoryError>;

    /// Rows whose `field` equals `value`.
    async fn find_by(&self, field: &str, value: &str) -> Result<Vec<E>, RepositoryError>;

    /// Stamps both timestamps and persists `entity`; the store assigns the id.
    async fn create(&self, entity: E) -> Result<E, RepositoryError>;

    /// Writes every column of `entity` except `Created At` onto row `id`.
    /// `None` when there is no such row.
    async fn update(&self, id: &str, entity: E) -> Result<Option<E>, RepositoryError>;

    /// `false` when there was no such row.
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;

    /// Deletes every row whose `field` equals `value`; `false` when nothing matched.
    async fn delete_by(&self, field: &str, value: &str) -> Result<bool, RepositoryError>;

    fn mode(&self) -> StorageMode;
}

pub type SharedRepository<E> = Arc<dyn Repository<E>>;

/// Builds the repository for one entity table according to `mode`.
///
/// `client` must be present for the remote and mirrored modes. `seed` only
/// populates the local store.
pub fn build<E: TableEntity>(
    mode: StorageMode,
    client: Option<&TableClient>,
    table: &str,
    seed: Vec<E>,
) -> Result<SharedRepository<E>, TableError> {
    let remote = || {
        client
            .cloned()
            .map(|client| RemoteRepository::new(client, table))
            .ok_or(TableError::ConfigMissing("AIRTABLE_API_KEY"))
    };

    Ok(match mode {
        StorageMode::Memory => Arc::new(MemoryRepository::new(seed)),
        StorageMode::Remote => Arc::new(remote()?),
        StorageMode::Mirrored => Arc::new(MirroredRepository::new(MemoryRepository::new(seed), remote()?)),
    })
}
