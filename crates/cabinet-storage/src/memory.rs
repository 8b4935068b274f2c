use crate::keys::{blob_key, content_key, derived_key};
use crate::traits::{ContentStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use cabinet_core::HealthStatus;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process content store. Content is lost on restart.
///
/// A single map insert publishes a payload, so writes are all-or-nothing.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored originals and derived assets.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    async fn put(&self, key: String, data: &[u8]) {
        tracing::debug!(key = %key, size_bytes = data.len(), "Memory storage write");
        self.blobs
            .write()
            .await
            .insert(key, Bytes::copy_from_slice(data));
    }
}

#[async_trait]
impl ContentStore for MemoryStorage {
    async fn write(&self, blob_id: Uuid, data: &[u8]) -> StorageResult<()> {
        self.put(blob_key(blob_id), data).await;
        Ok(())
    }

    async fn write_derived(&self, blob_id: Uuid, size: u32, data: &[u8]) -> StorageResult<()> {
        self.put(derived_key(blob_id, size), data).await;
        Ok(())
    }

    async fn read(&self, blob_id: Uuid, size: Option<u32>) -> StorageResult<Vec<u8>> {
        let key = content_key(blob_id, size);
        self.blobs
            .read()
            .await
            .get(&key)
            .map(|data| data.to_vec())
            .ok_or(StorageError::NotFound(key))
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus::Connected
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
