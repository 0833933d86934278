//! Canopy Server: application entry point.

use std::env;

use canopy_core::{CanopyError, CanopyResult};
use canopy_db::{DbConfig, DbError, DbManager, run_migrations};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canopy=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!("Starting Canopy server...");

    if let Err(err) = run().await {
        error!(error = %err, "Canopy server failed");
        std::process::exit(1);
    }

    info!("Canopy server stopped.");
}

async fn run() -> CanopyResult<()> {
    let config = db_config_from_env();
    let manager = DbManager::connect(&config).await.map_err(DbError::from)?;

    run_migrations(manager.client()).await?;

    info!("Canopy storage ready");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| CanopyError::Internal(e.to_string()))?;

    info!("Shutdown signal received");
    Ok(())
}

/// Reads `CANOPY_DB_*` overrides on top of the defaults.
fn db_config_from_env() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: env::var("CANOPY_DB_URL").unwrap_or(defaults.url),
        namespace: env::var("CANOPY_DB_NS").unwrap_or(defaults.namespace),
        database: env::var("CANOPY_DB_DATABASE").unwrap_or(defaults.database),
        username: env::var("CANOPY_DB_USER").unwrap_or(defaults.username),
        password: env::var("CANOPY_DB_PASSWORD").unwrap_or(defaults.password),
    }
}
