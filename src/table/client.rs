use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::RemoteConfig;

use super::error::TableError;
use super::record::{Fields, FieldsBody, ListPage, ListParams, Record};

/// Upper bound the remote service accepts for one bulk delete call.
pub const MAX_BULK_DELETE: usize = 10;

/// Minimal client for one base of the remote table service.
///
/// Every call is a single round trip (list follows the pagination cursor);
/// errors come back as-is and nothing is retried.
#[derive(Clone)]
pub struct TableClient {
    http: Client,
    api_url: Url,
    base_id: String,
    api_key: String,
}

impl std::fmt::Debug for TableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableClient")
            .field("api_url", &self.api_url.as_str())
            .field("base_id", &self.base_id)
            .finish_non_exhaustive()
    }
}

impl TableClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, TableError> {
        if config.api_key.trim().is_empty() {
            return Err(TableError::ConfigMissing("AIRTABLE_API_KEY"));
        }
        if config.base_id.trim().is_empty() {
            return Err(TableError::ConfigMissing("AIRTABLE_BASE_ID"));
        }

        let api_url =
            Url::parse(&config.api_url).map_err(|e| TableError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(TableError::InvalidUrl(config.api_url.clone()));
        }

        let mut builder = Client::builder().user_agent(concat!("worksite-api/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            api_url,
            base_id: config.base_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Lists every record of `table` matching `params`, following `offset` cursors.
    pub async fn list(&self, table: &str, params: &ListParams) -> Result<Vec<Record>, TableError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut url = self.table_url(table, None)?;
            let mut pairs = params.query_pairs();
            if let Some(cursor) = &offset {
                pairs.push(("offset".to_string(), cursor.clone()));
            }
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }

            debug!(table, filter = ?params.filter_by_formula, "listing remote records");
            let response = self.http.get(url).bearer_auth(&self.api_key).send().await?;
            let page: ListPage = Self::decode(response, table).await?;
            records.extend(page.records);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }

    pub async fn get(&self, table: &str, id: &str) -> Result<Record, TableError> {
        let url = self.table_url(table, Some(id))?;
        debug!(table, id, "fetching remote record");
        let response = self.http.get(url).bearer_auth(&self.api_key).send().await?;
        Self::decode(response, id).await
    }

    /// Creates a record; the remote service assigns the id and validates field names.
    pub async fn create(&self, table: &str, fields: &Fields) -> Result<Record, TableError> {
        let url = self.table_url(table, None)?;
        debug!(table, field_count = fields.len(), "creating remote record");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&FieldsBody { fields })
            .send()
            .await?;
        Self::decode(response, table).await
    }

    /// `partial = true` merges the given keys (PATCH); `false` replaces the row (PUT).
    pub async fn update(&self, table: &str, id: &str, fields: &Fields, partial: bool) -> Result<Record, TableError> {
        let url = self.table_url(table, Some(id))?;
        debug!(table, id, partial, "updating remote record");
        let request = if partial {
            self.http.patch(url)
        } else {
            self.http.put(url)
        };
        let response = request
            .bearer_auth(&self.api_key)
            .json(&FieldsBody { fields })
            .send()
            .await?;
        Self::decode(response, id).await
    }

    pub async fn delete(&self, table: &str, id: &str) -> Result<(), TableError> {
        let url = self.table_url(table, Some(id))?;
        debug!(table, id, "deleting remote record");
        let response = self.http.delete(url).bearer_auth(&self.api_key).send().await?;
        Self::expect_success(response, id).await
    }

    /// Deletes up to [`MAX_BULK_DELETE`] records in one call. Callers chunk larger sets.
    pub async fn bulk_delete(&self, table: &str, ids: &[String]) -> Result<(), TableError> {
        if ids.is_empty() {
            return Ok(());
        }
        if ids.len() > MAX_BULK_DELETE {
            return Err(TableError::TooManyRecords {
                max: MAX_BULK_DELETE,
                got: ids.len(),
            });
        }

        let mut url = self.table_url(table, None)?;
        url.query_pairs_mut()
            .extend_pairs(ids.iter().map(|id| ("records[]", id.as_str())));

        debug!(table, count = ids.len(), "bulk deleting remote records");
        let response = self.http.delete(url).bearer_auth(&self.api_key).send().await?;
        Self::expect_success(response, table).await
    }

    fn table_url(&self, table: &str, id: Option<&str>) -> Result<Url, TableError> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TableError::InvalidUrl(self.api_url.to_string()))?;
            segments.pop_if_empty().push(&self.base_id).push(table);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(response: Response, subject: &str) -> Result<T, TableError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TableError::from_response(status, &body, subject))
    }

    async fn expect_success(response: Response, subject: &str) -> Result<(), TableError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(TableError::from_response(status, &body, subject))
    }
}
