#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{ContentStore, MemoryStorage, StorageBackend, StorageResult};
use cabinet_core::Config;
use std::sync::Arc;

/// Create a content store based on configuration.
///
/// The returned handle is ready for use; a backend that cannot be prepared is a
/// startup error.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn ContentStore>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage = LocalStorage::new(config.folder_path()).await?;
            tracing::info!(path = %config.folder_path(), "Local content store ready");
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(crate::StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => {
            tracing::warn!("Using in-memory content store; content is lost on restart");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
