use std::env;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub security: SecurityConfig,
    pub bootstrap: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which repository variant backs every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageMode {
    /// Remote table service only.
    Remote,
    /// Process-local store only (demo/test).
    Memory,
    /// Local store, with every write mirrored to the remote service.
    Mirrored,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Remote => "remote",
            StorageMode::Memory => "memory",
            StorageMode::Mirrored => "mirrored",
        }
    }

    pub fn needs_remote(&self) -> bool {
        !matches!(self, StorageMode::Memory)
    }
}

impl FromStr for StorageMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" | "airtable" => Ok(StorageMode::Remote),
            "memory" | "in-memory" => Ok(StorageMode::Memory),
            "mirrored" | "mirror" => Ok(StorageMode::Mirrored),
            other => Err(ConfigError::Invalid {
                key: "STORAGE_MODE",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub mode: StorageMode,
    /// Seed the local location store with demo rows.
    pub seed_demo_data: bool,
}

#[derive(Clone)]
pub struct RemoteConfig {
    pub api_key: String,
    pub base_id: String,
    pub api_url: String,
    /// Per-request timeout; `None` keeps the transport default (no timeout).
    pub timeout_secs: Option<u64>,
    pub tables: TableNames,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_key", &"<redacted>")
            .field("base_id", &self.base_id)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("tables", &self.tables)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub locations: String,
    pub users: String,
    pub job_categories: String,
    pub job_types: String,
    pub product_groups: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            locations: "Locations".to_string(),
            users: "Users".to_string(),
            job_categories: "Job Categories".to_string(),
            job_types: "Job Types".to_string(),
            product_groups: "Product Groups".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: u64,
    pub password: PasswordParams,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_expiry_hours", &self.token_expiry_hours)
            .field("password", &self.password)
            .finish()
    }
}

/// Upper bound for `AUTH_TOKEN_EXPIRY`, one year.
pub const MAX_TOKEN_EXPIRY_HOURS: u64 = 24 * 365;

impl AuthConfig {
    /// `None` when the configured hours do not fit a [`Duration`].
    pub fn token_ttl(&self) -> Option<Duration> {
        i64::try_from(self.token_expiry_hours).ok().and_then(Duration::try_hours)
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Public URL verification links point at.
    pub base_url: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

/// Super admin created at startup when no user with this email exists.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = env::var("SERVER_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = parse_var("SERVER_PORT", &v)?;
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_MODE") {
            self.storage.mode = v.parse()?;
        }
        if let Ok(v) = env::var("SEED_DEMO_DATA") {
            self.storage.seed_demo_data = parse_var("SEED_DEMO_DATA", &v)?;
        }

        // Remote table overrides
        if let Ok(v) = env::var("AIRTABLE_API_KEY") {
            self.remote.api_key = v;
        }
        if let Ok(v) = env::var("AIRTABLE_BASE_ID") {
            self.remote.base_id = v;
        }
        if let Ok(v) = env::var("AIRTABLE_API_URL") {
            self.remote.api_url = v;
        }
        if let Ok(v) = env::var("AIRTABLE_TIMEOUT_SECS") {
            self.remote.timeout_secs = Some(parse_var("AIRTABLE_TIMEOUT_SECS", &v)?);
        }
        let tables = &mut self.remote.tables;
        for (key, slot) in [
            ("AIRTABLE_LOCATIONS_TABLE_NAME", &mut tables.locations),
            ("AIRTABLE_USERS_TABLE_NAME", &mut tables.users),
            ("AIRTABLE_JOB_CATEGORIES_TABLE_NAME", &mut tables.job_categories),
            ("AIRTABLE_JOB_TYPES_TABLE_NAME", &mut tables.job_types),
            ("AIRTABLE_PRODUCT_GROUPS_TABLE_NAME", &mut tables.product_groups),
        ] {
            if let Ok(v) = env::var(key) {
                if !v.trim().is_empty() {
                    *slot = v;
                }
            }
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = env::var("AUTH_TOKEN_EXPIRY") {
            self.auth.token_expiry_hours = parse_var("AUTH_TOKEN_EXPIRY", &v)?;
        }

        // Email overrides
        if let Ok(v) = env::var("EMAIL_BASE_URL") {
            self.email.base_url = v;
        }
        if let Ok(v) = env::var("EMAIL_FROM_EMAIL") {
            self.email.from_email = v;
        }
        if let Ok(v) = env::var("EMAIL_FROM_NAME") {
            self.email.from_name = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = parse_var("SECURITY_ENABLE_CORS", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let (Ok(email), Ok(password)) = (env::var("BOOTSTRAP_ADMIN_EMAIL"), env::var("BOOTSTRAP_ADMIN_PASSWORD")) {
            self.bootstrap = Some(BootstrapAdmin { email, password });
        }

        Ok(self)
    }

    /// Checks the values every component relies on being present.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Missing("SERVER_PORT"));
        }

        if self.storage.mode.needs_remote() {
            if self.remote.api_key.trim().is_empty() {
                return Err(ConfigError::Missing("AIRTABLE_API_KEY"));
            }
            if self.remote.base_id.trim().is_empty() {
                return Err(ConfigError::Missing("AIRTABLE_BASE_ID"));
            }
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("AUTH_JWT_SECRET"));
        }

        if self.auth.token_expiry_hours == 0 {
            self.auth.token_expiry_hours = 24;
        }
        if self.auth.token_expiry_hours > MAX_TOKEN_EXPIRY_HOURS {
            return Err(ConfigError::Invalid {
                key: "AUTH_TOKEN_EXPIRY",
                value: self.auth.token_expiry_hours.to_string(),
            });
        }

        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            storage: StorageConfig {
                mode: StorageMode::Memory,
                seed_demo_data: true,
            },
            remote: RemoteConfig {
                api_key: String::new(),
                base_id: String::new(),
                api_url: "https://api.airtable.com/v0".to_string(),
                timeout_secs: None,
                tables: TableNames::default(),
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                token_expiry_hours: 24,
                password: PasswordParams::default(),
            },
            email: EmailConfig {
                base_url: "http://localhost:8080".to_string(),
                from_email: "noreply@localhost".to_string(),
                from_name: "Worksite API".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
            },
            bootstrap: None,
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.storage = StorageConfig {
            mode: StorageMode::Mirrored,
            seed_demo_data: false,
        };
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.storage = StorageConfig {
            mode: StorageMode::Mirrored,
            seed_demo_data: false,
        };
        config.auth.token_expiry_hours = 12;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
