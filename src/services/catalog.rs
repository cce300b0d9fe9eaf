use tracing::info;

use crate::repository::slug::{slugify, unique_slug};
use crate::repository::{SharedRepository, Slugged};

use super::{kind_label, ServiceError};

/// Changes accepted by [`Catalog::update`]. At least one must be set.
#[derive(Debug, Clone, Default)]
pub struct CatalogUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub status: Option<String>,
}

impl CatalogUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.status.is_none()
    }
}

/// Name/slug catalog of one entity kind (locations, job categories, ...).
///
/// Slug uniqueness is checked against a full listing right before the write.
/// Nothing locks across the two steps, so concurrent creates of the same
/// name can both get the same slug; the remote table has no unique
/// constraint to catch it.
pub struct Catalog<E> {
    repo: SharedRepository<E>,
}

impl<E> Clone for Catalog<E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<E: Slugged> Catalog<E> {
    pub fn new(repo: SharedRepository<E>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &SharedRepository<E> {
        &self.repo
    }

    pub async fn list(&self) -> Vec<E> {
        self.repo.list().await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<E, ServiceError> {
        let slug = normalize(slug)?;
        self.repo
            .find_by(E::SLUG_FIELD, &slug)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(kind_label(E::KIND)))
    }

    /// Creates an entry. The slug comes from `slug` when given, else from
    /// `name`, and gets the smallest free `-N` suffix on collision.
    pub async fn create(&self, name: &str, slug: Option<&str>) -> Result<E, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid_field("name", "is required"));
        }

        let base = slug
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(name));

        let existing = self.repo.list().await;
        let slug = unique_slug(&base, E::KIND, existing.iter().map(|e| e.slug()));

        let created = self.repo.create(E::build(name.to_string(), slug)).await?;
        info!(kind = E::KIND, id = %created.id(), slug = %created.slug(), "created");
        Ok(created)
    }

    /// Renaming to a slug already held by another entry is a conflict; it is
    /// not suffixed like on create.
    pub async fn update(&self, slug: &str, changes: CatalogUpdate) -> Result<E, ServiceError> {
        if changes.is_empty() {
            return Err(ServiceError::validation("At least one field must be provided"));
        }

        let mut entity = self.get_by_slug(slug).await?;

        if let Some(name) = changes.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(ServiceError::invalid_field("name", "must not be empty"));
            }
            entity.set_name(name.to_string());
        }

        if let Some(new_slug) = changes.slug {
            let new_slug = slugify(&new_slug);
            if new_slug.is_empty() {
                return Err(ServiceError::invalid_field("slug", "Invalid slug format"));
            }
            if new_slug != entity.slug() {
                let taken = self
                    .repo
                    .list()
                    .await
                    .iter()
                    .any(|other| other.slug() == new_slug && other.id() != entity.id());
                if taken {
                    return Err(ServiceError::Conflict(format!("Slug '{new_slug}' is already in use")));
                }
                entity.set_slug(new_slug);
            }
        }

        if let Some(status) = changes.status {
            entity
                .set_status(&status)
                .map_err(|problem| ServiceError::invalid_field("status", problem))?;
        }

        let id = entity.id().to_string();
        self.repo
            .update(&id, entity)
            .await?
            .ok_or_else(|| ServiceError::NotFound(kind_label(E::KIND)))
    }

    pub async fn delete_by_slug(&self, slug: &str) -> Result<(), ServiceError> {
        let slug = normalize(slug)?;
        if self.repo.delete_by(E::SLUG_FIELD, &slug).await? {
            info!(kind = E::KIND, slug = %slug, "deleted");
            Ok(())
        } else {
            Err(ServiceError::NotFound(kind_label(E::KIND)))
        }
    }
}

fn normalize(slug: &str) -> Result<String, ServiceError> {
    let normalized = slugify(slug);
    if normalized.is_empty() {
        return Err(ServiceError::validation("Invalid slug format"));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::entities::{JobCategory, Location, LocationStatus};
    use crate::repository::MemoryRepository;

    fn locations() -> Catalog<Location> {
        Catalog::new(Arc::new(MemoryRepository::new(Vec::new())))
    }

    #[tokio::test]
    async fn test_same_name_twice_gets_suffix() {
        let catalog = locations();
        let first = catalog.create("Main Library", None).await.unwrap();
        let second = catalog.create("Main Library", None).await.unwrap();

        assert_eq!(first.slug, "main-library");
        assert_eq!(second.slug, "main-library-1");
        assert_eq!(catalog.get_by_slug("main-library").await.unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_explicit_free_slug_is_kept() {
        let catalog = locations();
        let created = catalog.create("Main Library", Some("downtown")).await.unwrap();
        assert_eq!(created.slug, "downtown");
    }

    #[tokio::test]
    async fn test_unsluggable_name_falls_back_to_kind() {
        let catalog = Catalog::<JobCategory>::new(Arc::new(MemoryRepository::new(Vec::new())));
        let created = catalog.create("???", None).await.unwrap();
        assert_eq!(created.slug, "job-category");
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let err = locations().create("   ", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_by_slug_twice() {
        let catalog = locations();
        catalog.create("West Branch", None).await.unwrap();

        catalog.delete_by_slug("West Branch").await.unwrap();
        assert!(matches!(
            catalog.delete_by_slug("west-branch").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            catalog.delete_by_slug("!!!").await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_rename_and_status() {
        let catalog = locations();
        catalog.create("Main Library", None).await.unwrap();
        catalog.create("West Branch", None).await.unwrap();

        let updated = catalog
            .update(
                "main-library",
                CatalogUpdate {
                    name: Some("Central Library".to_string()),
                    slug: Some("Central Library".to_string()),
                    status: Some("inactive".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, "central-library");
        assert_eq!(updated.status, LocationStatus::Inactive);

        let conflict = catalog
            .update(
                "central-library",
                CatalogUpdate {
                    slug: Some("west-branch".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(conflict, ServiceError::Conflict(_)));

        let empty = catalog.update("central-library", CatalogUpdate::default()).await;
        assert!(matches!(empty, Err(ServiceError::Validation { .. })));
    }
}
