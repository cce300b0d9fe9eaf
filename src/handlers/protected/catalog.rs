// handlers/protected/catalog.rs - slug-addressed CRUD shared by every catalog
//
// GET/POST  /api/{locations,job-categories,job-types,product-groups}
// GET/PUT/DELETE  /api/{...}/:slug

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::repository::Slugged;
use crate::services::{kind_label, Catalog, CatalogUpdate};

#[derive(Debug, Deserialize)]
pub struct CreateCatalogRequest {
    pub name: String,
    /// Derived from `name` when absent.
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCatalogRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub status: Option<String>,
}

pub async fn list<E>(State(catalog): State<Catalog<E>>) -> ApiResult<Vec<E>>
where
    E: Slugged + Serialize,
{
    let items = catalog.list().await;
    Ok(ApiResponse::success(items).with_message(format!("{} list retrieved successfully", kind_label(E::KIND))))
}

pub async fn show<E>(State(catalog): State<Catalog<E>>, Path(slug): Path<String>) -> ApiResult<E>
where
    E: Slugged + Serialize,
{
    let item = catalog.get_by_slug(&slug).await?;
    Ok(ApiResponse::success(item))
}

pub async fn create<E>(
    State(catalog): State<Catalog<E>>,
    ValidJson(payload): ValidJson<CreateCatalogRequest>,
) -> ApiResult<E>
where
    E: Slugged + Serialize,
{
    let item = catalog.create(&payload.name, payload.slug.as_deref()).await?;
    Ok(ApiResponse::created(item).with_message(format!("{} created successfully", kind_label(E::KIND))))
}

pub async fn update<E>(
    State(catalog): State<Catalog<E>>,
    Path(slug): Path<String>,
    ValidJson(payload): ValidJson<UpdateCatalogRequest>,
) -> ApiResult<E>
where
    E: Slugged + Serialize,
{
    let changes = CatalogUpdate {
        name: payload.name,
        slug: payload.slug,
        status: payload.status,
    };
    let item = catalog.update(&slug, changes).await?;
    Ok(ApiResponse::success(item).with_message(format!("{} updated successfully", kind_label(E::KIND))))
}

pub async fn delete<E>(State(catalog): State<Catalog<E>>, Path(slug): Path<String>) -> ApiResult<()>
where
    E: Slugged + Serialize,
{
    catalog.delete_by_slug(&slug).await?;
    Ok(ApiResponse::message_only(format!("{} deleted successfully", kind_label(E::KIND))))
}
