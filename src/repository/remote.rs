use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::config::StorageMode;
use crate::table::{formula, ListParams, Record, TableClient, TableError, MAX_BULK_DELETE};

use super::entity::{TableEntity, Timestamps};
use super::{Repository, RepositoryError};

/// Repository backed only by the remote table service.
pub struct RemoteRepository<E> {
    client: TableClient,
    table: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: TableEntity> RemoteRepository<E> {
    pub fn new(client: TableClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
            _entity: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Lists and maps rows, skipping the ones that do not map.
    pub async fn fetch(&self, params: &ListParams) -> Result<Vec<E>, TableError> {
        let records = self.client.list(&self.table, params).await?;
        Ok(records.iter().filter_map(|record| self.map(record)).collect())
    }

    fn map(&self, record: &Record) -> Option<E> {
        match E::from_record(record) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(table = %self.table, error = %e, "skipping unmappable {} record", E::KIND);
                None
            }
        }
    }

    /// Creates the row as given, without stamping.
    pub(crate) async fn insert(&self, entity: &E) -> Result<E, RepositoryError> {
        let record = self.client.create(&self.table, &entity.to_fields()).await?;
        Ok(E::from_record(&record)?)
    }

    /// Partial update without stamping. `Created At` is never rewritten.
    pub(crate) async fn patch(&self, id: &str, entity: &E) -> Result<Option<E>, RepositoryError> {
        let mut fields = entity.to_fields();
        fields.remove(Timestamps::CREATED_AT);

        match self.client.update(&self.table, id, &fields, true).await {
            Ok(record) => Ok(Some(E::from_record(&record)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) async fn remove(&self, id: &str) -> Result<bool, RepositoryError> {
        match self.client.delete(&self.table, id).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Looks the ids up by formula, then bulk deletes them in chunks the
    /// service accepts.
    pub(crate) async fn remove_by(&self, field: &str, value: &str) -> Result<bool, RepositoryError> {
        let params = ListParams::filter(formula::field_equals(field, value));
        let ids: Vec<String> = self
            .client
            .list(&self.table, &params)
            .await?
            .into_iter()
            .map(|record| record.id)
            .collect();

        if ids.is_empty() {
            return Ok(false);
        }

        for chunk in ids.chunks(MAX_BULK_DELETE) {
            self.client.bulk_delete(&self.table, chunk).await?;
        }
        debug!(table = %self.table, field, count = ids.len(), "deleted matching records");
        Ok(true)
    }
}

#[async_trait]
impl<E: TableEntity> Repository<E> for RemoteRepository<E> {
    async fn list(&self) -> Vec<E> {
        match self.fetch(&ListParams::default()).await {
            Ok(entities) => entities,
            Err(e) => {
                warn!(table = %self.table, error = %e, "listing remote {} records failed", E::KIND);
                Vec::new()
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<E>, RepositoryError> {
        match self.client.get(&self.table, id).await {
            Ok(record) => Ok(Some(E::from_record(&record)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by(&self, field: &str, value: &str) -> Result<Vec<E>, RepositoryError> {
        let params = ListParams::filter(formula::field_equals(field, value));
        Ok(self.fetch(&params).await?)
    }

    async fn create(&self, mut entity: E) -> Result<E, RepositoryError> {
        entity.timestamps_mut().stamp_created(Utc::now());
        self.insert(&entity).await
    }

    async fn update(&self, id: &str, mut entity: E) -> Result<Option<E>, RepositoryError> {
        entity.timestamps_mut().stamp_updated(Utc::now());
        self.patch(id, &entity).await
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        self.remove(id).await
    }

    async fn delete_by(&self, field: &str, value: &str) -> Result<bool, RepositoryError> {
        self.remove_by(field, value).await
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Remote
    }
}
