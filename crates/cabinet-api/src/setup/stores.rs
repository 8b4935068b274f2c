use anyhow::{Context, Result};
use cabinet_core::Config;
use cabinet_db::{create_stores, MetadataStore, Stores};
use cabinet_storage::{create_storage, ContentStore};
use std::sync::Arc;

/// Metadata, user and token stores, connected and migrated.
pub async fn setup_stores(config: &Config) -> Result<Stores> {
    let stores = create_stores(config)
        .await
        .context("Failed to initialize metadata stores")?;

    let status = stores.metadata.health().await;
    if !status.is_connected() {
        anyhow::bail!("Metadata store is {} after initialization", status);
    }

    tracing::info!(backend = ?config.metadata_backend(), "Metadata stores ready");
    Ok(stores)
}

/// Content store with its root directory created.
pub async fn setup_content_store(config: &Config) -> Result<Arc<dyn ContentStore>> {
    let content = create_storage(config)
        .await
        .context("Failed to initialize content store")?;

    let status = content.health().await;
    if !status.is_connected() {
        anyhow::bail!("Content store is {} after initialization", status);
    }

    tracing::info!(
        backend = ?content.backend_type(),
        folder_path = %config.folder_path(),
        "Content store ready"
    );
    Ok(content)
}
