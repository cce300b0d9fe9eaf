use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::config::StorageMode;

use super::entity::TableEntity;
use super::{Repository, RepositoryError};

struct Rows<E> {
    by_id: BTreeMap<String, E>,
    next_id: u64,
}

/// Process-local store. Ids are decimal counters; listing is ordered by id
/// compared as text, so `"10"` sorts before `"2"`.
pub struct MemoryRepository<E> {
    rows: RwLock<Rows<E>>,
}

impl<E: TableEntity> MemoryRepository<E> {
    /// The id counter starts after the largest numeric seed id. Seeds without
    /// an id are numbered from there.
    pub fn new(seed: Vec<E>) -> Self {
        let max_seed = seed
            .iter()
            .filter_map(|entity| entity.id().parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        let mut rows = Rows {
            by_id: BTreeMap::new(),
            next_id: max_seed + 1,
        };
        for mut entity in seed {
            if entity.id().is_empty() {
                entity.set_id(rows.next_id.to_string());
                rows.next_id += 1;
            }
            rows.by_id.insert(entity.id().to_string(), entity);
        }

        Self { rows: RwLock::new(rows) }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.by_id.is_empty()
    }

    pub(crate) async fn snapshot(&self) -> Vec<E> {
        self.rows.read().await.by_id.values().cloned().collect()
    }

    pub(crate) async fn lookup(&self, id: &str) -> Option<E> {
        self.rows.read().await.by_id.get(id).cloned()
    }

    pub(crate) async fn matching(&self, field: &str, value: &str) -> Vec<E> {
        self.rows
            .read()
            .await
            .by_id
            .values()
            .filter(|entity| entity.field_text(field).as_deref() == Some(value))
            .cloned()
            .collect()
    }

    /// Assigns the next id and stores the entity as given.
    pub(crate) async fn insert(&self, mut entity: E) -> E {
        let mut rows = self.rows.write().await;
        entity.set_id(rows.next_id.to_string());
        rows.next_id += 1;
        rows.by_id.insert(entity.id().to_string(), entity.clone());
        entity
    }

    /// Replaces row `id`, keeping its original `created_at`.
    pub(crate) async fn replace(&self, id: &str, mut entity: E) -> Option<E> {
        let mut rows = self.rows.write().await;
        let existing = rows.by_id.get_mut(id)?;
        entity.set_id(id.to_string());
        entity.timestamps_mut().created_at = existing.timestamps().created_at;
        *existing = entity.clone();
        Some(entity)
    }

    pub(crate) async fn remove(&self, id: &str) -> bool {
        self.rows.write().await.by_id.remove(id).is_some()
    }

    pub(crate) async fn remove_matching(&self, field: &str, value: &str) -> bool {
        let mut rows = self.rows.write().await;
        let before = rows.by_id.len();
        rows.by_id
            .retain(|_, entity| entity.field_text(field).as_deref() != Some(value));
        rows.by_id.len() != before
    }

    /// Moves row `from` to id `to`, used once the remote service has assigned
    /// its own id to a mirrored row.
    pub(crate) async fn rekey(&self, from: &str, to: &str) -> bool {
        let mut rows = self.rows.write().await;
        match rows.by_id.remove(from) {
            Some(mut entity) => {
                entity.set_id(to.to_string());
                rows.by_id.insert(to.to_string(), entity);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl<E: TableEntity> Repository<E> for MemoryRepository<E> {
    async fn list(&self) -> Vec<E> {
        self.snapshot().await
    }

    async fn get(&self, id: &str) -> Result<Option<E>, RepositoryError> {
        Ok(self.lookup(id).await)
    }

    async fn find_by(&self, field: &str, value: &str) -> Result<Vec<E>, RepositoryError> {
        Ok(self.matching(field, value).await)
    }

    async fn create(&self, mut entity: E) -> Result<E, RepositoryError> {
        entity.timestamps_mut().stamp_created(Utc::now());
        Ok(self.insert(entity).await)
    }

    async fn update(&self, id: &str, mut entity: E) -> Result<Option<E>, RepositoryError> {
        entity.timestamps_mut().stamp_updated(Utc::now());
        Ok(self.replace(id, entity).await)
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.remove(id).await)
    }

    async fn delete_by(&self, field: &str, value: &str) -> Result<bool, RepositoryError> {
        Ok(self.remove_matching(field, value).await)
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Memory
    }
}
