use std::sync::Arc;

use axum::extract::FromRef;
use tracing::info;

use crate::config::AppConfig;
use crate::entities::{JobCategory, JobType, Location, ProductGroup, User};
use crate::middleware::JwtSecret;
use crate::repository::{self, Slugged, TableEntity};
use crate::services::{Accounts, Catalog, LogMailer, Mailer};
use crate::table::{TableClient, TableError};

/// Everything handlers need, built once from [`AppConfig`] and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt_secret: JwtSecret,
    pub accounts: Accounts,
    pub locations: Catalog<Location>,
    pub job_categories: Catalog<JobCategory>,
    pub job_types: Catalog<JobType>,
    pub product_groups: Catalog<ProductGroup>,
}

impl AppState {
    /// Builds one repository per table in the configured storage mode.
    pub fn from_config(config: AppConfig) -> Result<Self, TableError> {
        let mode = config.storage.mode;
        let client = if mode.needs_remote() {
            Some(TableClient::new(&config.remote)?)
        } else {
            None
        };
        let client = client.as_ref();
        let tables = &config.remote.tables;

        let location_seed = if config.storage.seed_demo_data {
            demo_locations()
        } else {
            Vec::new()
        };

        let users = repository::build::<User>(mode, client, &tables.users, Vec::new())?;
        let locations = repository::build(mode, client, &tables.locations, location_seed)?;
        let job_categories = repository::build(mode, client, &tables.job_categories, Vec::new())?;
        let job_types = repository::build(mode, client, &tables.job_types, Vec::new())?;
        let product_groups = repository::build(mode, client, &tables.product_groups, Vec::new())?;

        info!(storage = mode.as_str(), "repositories ready");

        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(&config.email));
        let accounts = Accounts::new(users, config.auth.clone(), config.email.clone(), mailer);

        Ok(Self {
            jwt_secret: JwtSecret::new(&config.auth.jwt_secret),
            config: Arc::new(config),
            accounts,
            locations: Catalog::new(locations),
            job_categories: Catalog::new(job_categories),
            job_types: Catalog::new(job_types),
            product_groups: Catalog::new(product_groups),
        })
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.accounts = self.accounts.with_mailer(mailer);
        self
    }
}

fn demo_locations() -> Vec<Location> {
    [("1", "Main Library"), ("2", "West Branch")]
        .into_iter()
        .map(|(id, name)| {
            let mut location = Location::build(name.to_string(), repository::slug::slugify(name));
            location.set_id(id.to_string());
            location
        })
        .collect()
}

impl FromRef<AppState> for Accounts {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Catalog<Location> {
    fn from_ref(state: &AppState) -> Self {
        state.locations.clone()
    }
}

impl FromRef<AppState> for Catalog<JobCategory> {
    fn from_ref(state: &AppState) -> Self {
        state.job_categories.clone()
    }
}

impl FromRef<AppState> for Catalog<JobType> {
    fn from_ref(state: &AppState) -> Self {
        state.job_types.clone()
    }
}

impl FromRef<AppState> for Catalog<ProductGroup> {
    fn from_ref(state: &AppState) -> Self {
        state.product_groups.clone()
    }
}
