use cabinet_core::models::{FileRecord, Visibility};
use cabinet_core::AppError;
use cabinet_db::MetadataStore;
use cabinet_storage::ContentStore;
use std::sync::Arc;
use std::time::Duration;

use super::{parse_record_id, with_timeout};
use crate::auth::{AccessGuard, Action, AuthUser};

/// Single-record reads, visibility changes and content retrieval.
#[derive(Clone)]
pub struct FileService {
    metadata: Arc<dyn MetadataStore>,
    content: Arc<dyn ContentStore>,
    guard: Arc<AccessGuard>,
    sizes: Vec<u32>,
    timeout: Duration,
}

impl FileService {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        content: Arc<dyn ContentStore>,
        guard: Arc<AccessGuard>,
        sizes: Vec<u32>,
        timeout: Duration,
    ) -> Self {
        Self {
            metadata,
            content,
            guard,
            sizes,
            timeout,
        }
    }

    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Fetch a record and check `action` against it; absent and hidden look the same.
    async fn load(
        &self,
        id: &str,
        identity: Option<&AuthUser>,
        action: Action,
    ) -> Result<FileRecord, AppError> {
        let id = parse_record_id(id)?;
        let record = with_timeout(self.timeout, "metadata get", self.metadata.get(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))?;

        self.guard.authorize(&record, identity, action)?;
        Ok(record)
    }

    #[tracing::instrument(skip(self, identity), fields(operation = "get_file"))]
    pub async fn get(&self, id: &str, identity: Option<&AuthUser>) -> Result<FileRecord, AppError> {
        self.load(id, identity, Action::Read).await
    }

    /// Owner-only visibility change. Only the visibility field is written.
    #[tracing::instrument(skip(self, user), fields(user.id = %user.user_id, operation = "set_visibility"))]
    pub async fn set_visibility(
        &self,
        id: &str,
        user: &AuthUser,
        visibility: Visibility,
    ) -> Result<FileRecord, AppError> {
        let record = self.load(id, Some(user), Action::Write).await?;

        let updated = with_timeout(
            self.timeout,
            "metadata update_visibility",
            self.metadata.update_visibility(record.id, visibility),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {} not found", record.id)))?;

        tracing::info!(file.id = %updated.id, visibility = %visibility, "File visibility updated");
        Ok(updated)
    }

    /// Content of a readable record, or of one of its derived sizes.
    ///
    /// Returns the record too so callers can derive the content type from its name.
    #[tracing::instrument(skip(self, identity), fields(operation = "read_content"))]
    pub async fn read_content(
        &self,
        id: &str,
        identity: Option<&AuthUser>,
        size: Option<u32>,
    ) -> Result<(FileRecord, Vec<u8>), AppError> {
        if let Some(size) = size {
            if !self.sizes.contains(&size) {
                return Err(AppError::InvalidInput(format!(
                    "Unsupported size {}, expected one of {:?}",
                    size, self.sizes
                )));
            }
        }

        let record = self.load(id, identity, Action::Read).await?;

        let Some(blob_id) = record.blob_id else {
            return Err(AppError::InvalidInput(
                "A folder doesn't have content".to_string(),
            ));
        };

        let data = with_timeout(self.timeout, "content read", async {
            self.content
                .read(blob_id, size)
                .await
                .map_err(AppError::from)
        })
        .await?;

        tracing::debug!(
            file.id = %record.id,
            blob.id = %blob_id,
            size_bytes = data.len(),
            "Content read"
        );

        Ok((record, data))
    }
}
