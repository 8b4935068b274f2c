//! Content store abstraction trait

use crate::StorageBackend;
use async_trait::async_trait;
use cabinet_core::{AppError, HealthStatus};
use thiserror::Error;
use uuid::Uuid;

/// Content store operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Blob {}", key)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for content store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob repository addressed by generated identifiers.
///
/// `write` and `write_derived` are all-or-nothing: a failed call leaves no partial
/// content visible under the target key, and a successful one replaces any previous
/// content in full.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Allocate a fresh blob id, unrelated to any record id.
    fn allocate_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    /// Store the original content of `blob_id`.
    async fn write(&self, blob_id: Uuid, data: &[u8]) -> StorageResult<()>;

    /// Store the derived asset of `blob_id` at `size`.
    async fn write_derived(&self, blob_id: Uuid, size: u32, data: &[u8]) -> StorageResult<()>;

    /// Read the original content, or the derived asset when `size` is given.
    async fn read(&self, blob_id: Uuid, size: Option<u32>) -> StorageResult<Vec<u8>>;

    /// Liveness of the backend.
    async fn health(&self) -> HealthStatus;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
