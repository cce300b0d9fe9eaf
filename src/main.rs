use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use worksite_api::config::{AppConfig, StorageMode};
use worksite_api::{router, AppState};

/// REST API for locations, users and job catalogs backed by a hosted table service.
#[derive(Debug, Parser)]
#[command(name = "worksite-api", version, about)]
struct Cli {
    /// Interface to bind (overrides SERVER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides SERVER_PORT)
    #[arg(long, short)]
    port: Option<u16>,

    /// Storage backend for every entity table (overrides STORAGE_MODE)
    #[arg(long, value_enum)]
    storage: Option<StorageMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("worksite_api=info,tower_http=info")),
        )
        .init();

    // Load .env if present so cargo run picks up AIRTABLE_*, AUTH_*, etc.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("failed to read configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(storage) = cli.storage {
        config.storage.mode = storage;
    }
    config.validate().context("invalid configuration")?;

    tracing::info!(
        environment = ?config.environment,
        storage = config.storage.mode.as_str(),
        "starting worksite API"
    );

    let bind_addr = config.server_address();
    let bootstrap = config.bootstrap.clone();

    let state = AppState::from_config(config).context("failed to initialize storage")?;

    if let Some(admin) = bootstrap {
        state
            .accounts
            .bootstrap_super_admin(&admin.email, &admin.password)
            .await
            .context("failed to create bootstrap super admin")?;
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, router(state)).await.context("server error")?;

    Ok(())
}
