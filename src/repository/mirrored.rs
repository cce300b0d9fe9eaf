use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::config::StorageMode;
use crate::table::{formula, ListParams};

use super::entity::TableEntity;
use super::memory::MemoryRepository;
use super::remote::RemoteRepository;
use super::{Repository, RepositoryError};

/// Local store whose writes are mirrored to the remote service.
///
/// Writes land locally first and the remote call is made after the local
/// lock is released. A failed remote write is logged and the local result
/// stands; nothing is rolled back. Reads prefer the remote service and fall
/// back to the local rows when it fails or returns nothing.
/// A row whose remote create failed exists only locally, so it is hidden
/// from `list` whenever the remote table has any rows.
pub struct MirroredRepository<E> {
    local: MemoryRepository<E>,
    remote: RemoteRepository<E>,
}

impl<E: TableEntity> MirroredRepository<E> {
    pub fn new(local: MemoryRepository<E>, remote: RemoteRepository<E>) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> &MemoryRepository<E> {
        &self.local
    }
}

#[async_trait]
impl<E: TableEntity> Repository<E> for MirroredRepository<E> {
    async fn list(&self) -> Vec<E> {
        match self.remote.fetch(&ListParams::default()).await {
            Ok(entities) if !entities.is_empty() => entities,
            Ok(_) => self.local.snapshot().await,
            Err(e) => {
                warn!(table = %self.remote.table(), error = %e, "remote list failed, serving local {} rows", E::KIND);
                self.local.snapshot().await
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<E>, RepositoryError> {
        match self.remote.get(id).await {
            Ok(Some(entity)) => Ok(Some(entity)),
            Ok(None) => Ok(self.local.lookup(id).await),
            Err(e) => {
                warn!(table = %self.remote.table(), id, error = %e, "remote get failed, serving local row");
                Ok(self.local.lookup(id).await)
            }
        }
    }

    async fn find_by(&self, field: &str, value: &str) -> Result<Vec<E>, RepositoryError> {
        let params = ListParams::filter(formula::field_equals(field, value));
        match self.remote.fetch(&params).await {
            Ok(entities) if !entities.is_empty() => Ok(entities),
            Ok(_) => Ok(self.local.matching(field, value).await),
            Err(e) => {
                warn!(table = %self.remote.table(), field, error = %e, "remote lookup failed, searching local rows");
                Ok(self.local.matching(field, value).await)
            }
        }
    }

    async fn create(&self, mut entity: E) -> Result<E, RepositoryError> {
        entity.timestamps_mut().stamp_created(Utc::now());
        let mut created = self.local.insert(entity).await;

        match self.remote.insert(&created).await {
            Ok(remote) if !remote.id().is_empty() => {
                self.local.rekey(created.id(), remote.id()).await;
                debug!(local_id = %created.id(), remote_id = %remote.id(), "mirrored {} to remote", E::KIND);
                created.set_id(remote.id().to_string());
            }
            Ok(_) => {}
            Err(e) => {
                warn!(table = %self.remote.table(), id = %created.id(), error = %e, "remote create failed, keeping local {}", E::KIND);
            }
        }

        Ok(created)
    }

    async fn update(&self, id: &str, mut entity: E) -> Result<Option<E>, RepositoryError> {
        entity.timestamps_mut().stamp_updated(Utc::now());
        let local = self.local.replace(id, entity.clone()).await;

        let remote = match self.remote.patch(id, &entity).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(table = %self.remote.table(), id, error = %e, "remote update failed");
                None
            }
        };

        Ok(local.or(remote))
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let local = self.local.remove(id).await;

        let remote = match self.remote.remove(id).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(table = %self.remote.table(), id, error = %e, "remote delete failed");
                false
            }
        };

        Ok(local || remote)
    }

    async fn delete_by(&self, field: &str, value: &str) -> Result<bool, RepositoryError> {
        let local = self.local.remove_matching(field, value).await;

        let remote = match self.remote.remove_by(field, value).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(table = %self.remote.table(), field, error = %e, "remote delete failed");
                false
            }
        };

        Ok(local || remote)
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Mirrored
    }
}
