use crate::keys::{blob_key, content_key, derived_key};
use crate::traits::{ContentStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use cabinet_core::HealthStatus;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const STAGING_DIR: &str = ".staging";

/// Local filesystem content store
///
/// Blobs live flat under `base_path`. Writes go to `base_path/.staging` first and are
/// renamed into place once synced; both directories share a filesystem so the rename
/// is atomic.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    staging_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `base_path` (e.g. "/tmp/files_manager").
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        let staging_path = base_path.join(STAGING_DIR);

        fs::create_dir_all(&staging_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            staging_path,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a key to a filesystem path. Keys are flat file names.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty()
            || key.contains("..")
            || key.contains('/')
            || key.contains('\\')
            || key.starts_with('.')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(key))
    }

    /// Stage `data` under a unique temporary name, sync it, then rename it over `key`.
    async fn publish(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let staged = self.staging_path.join(format!("{}.tmp", Uuid::new_v4()));
        let start = std::time::Instant::now();

        if let Err(e) = Self::write_staged(&staged, data).await {
            discard_staged(&staged).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&staged, &path).await {
            discard_staged(&staged).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to publish {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    async fn write_staged(staged: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = fs::File::create(staged).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create staging file {}: {}",
                staged.display(),
                e
            ))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write staging file {}: {}",
                staged.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync staging file {}: {}",
                staged.display(),
                e
            ))
        })?;

        Ok(())
    }
}

async fn discard_staged(staged: &Path) {
    if let Err(e) = fs::remove_file(staged).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %staged.display(), error = %e, "Failed to remove staging file");
        }
    }
}

#[async_trait]
impl ContentStore for LocalStorage {
    async fn write(&self, blob_id: Uuid, data: &[u8]) -> StorageResult<()> {
        self.publish(&blob_key(blob_id), data).await
    }

    async fn write_derived(&self, blob_id: Uuid, size: u32, data: &[u8]) -> StorageResult<()> {
        self.publish(&derived_key(blob_id, size), data).await
    }

    async fn read(&self, blob_id: Uuid, size: Option<u32>) -> StorageResult<Vec<u8>> {
        let key = content_key(blob_id, size);
        let path = self.key_to_path(&key)?;
        let start = std::time::Instant::now();

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key));
            }
            Err(e) => {
                return Err(StorageError::DownloadFailed(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        tracing::debug!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(data)
    }

    async fn health(&self) -> HealthStatus {
        match fs::metadata(&self.staging_path).await {
            Ok(meta) if meta.is_dir() => HealthStatus::Connected,
            Ok(_) => HealthStatus::Disconnected,
            Err(e) => {
                tracing::warn!(path = %self.base_path.display(), error = %e, "Local storage health check failed");
                HealthStatus::Disconnected
            }
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
