//! Application setup and initialization
//!
//! Everything the server needs is built here before the listener binds. Any failure
//! aborts startup; no half-initialized store is ever reachable from a handler.

pub mod routes;
pub mod server;
pub mod services;
pub mod stores;

use crate::state::AppState;
use anyhow::{Context, Result};
use cabinet_core::Config;
use cabinet_db::Stores;
use cabinet_storage::ContentStore;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        metadata_backend = ?config.metadata_backend(),
        storage_backend = ?config.storage_backend(),
        "Configuration loaded and validated successfully"
    );

    let stores = stores::setup_stores(&config).await?;
    let content = stores::setup_content_store(&config).await?;

    build_app(config, stores, content)
}

/// Wire ready stores into services and routes.
pub fn build_app(
    config: Config,
    stores: Stores,
    content: Arc<dyn ContentStore>,
) -> Result<(Arc<AppState>, axum::Router)> {
    let state = services::initialize_services(config, stores, content);
    let router = routes::setup_routes(state.clone())?;
    Ok((state, router))
}
