use anyhow::anyhow;
use cabinet_core::models::{FileKind, ThumbnailJob};
use cabinet_core::{TaskError, TaskResultExt};
use cabinet_db::MetadataStore;
use cabinet_processing::ThumbnailGenerator;
use cabinet_storage::ContentStore;
use std::sync::Arc;

/// Derives the configured thumbnail widths for one image record.
///
/// Processing is an idempotent overwrite: running the same job twice writes the same
/// bytes to the same keys.
#[derive(Clone)]
pub struct ThumbnailWorker {
    metadata: Arc<dyn MetadataStore>,
    content: Arc<dyn ContentStore>,
    sizes: Arc<[u32]>,
}

impl ThumbnailWorker {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        content: Arc<dyn ContentStore>,
        sizes: &[u32],
    ) -> Self {
        Self {
            metadata,
            content,
            sizes: sizes.into(),
        }
    }

    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Process one job.
    ///
    /// Store I/O failures are recoverable. A missing or mismatched record, missing
    /// source content or an undecodable image are not.
    #[tracing::instrument(skip(self), fields(file.id = %job.file_id, blob.id = %job.blob_id))]
    pub async fn process(&self, job: ThumbnailJob) -> Result<(), TaskError> {
        let record = self
            .metadata
            .get(job.file_id)
            .await
            .recoverable()?
            .ok_or_else(|| TaskError::unrecoverable(anyhow!("File record {} not found", job.file_id)))?;

        if !record.is_owned_by(job.user_id)
            || record.kind != FileKind::Image
            || record.blob_id != Some(job.blob_id)
        {
            return Err(TaskError::unrecoverable(anyhow!(
                "File record {} no longer matches the job",
                job.file_id
            )));
        }

        let source = match self.content.read(job.blob_id, None).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => {
                return Err(TaskError::unrecoverable(anyhow!(
                    "Source content {} is missing",
                    job.blob_id
                )))
            }
            Err(e) => return Err(TaskError::recoverable(e.into())),
        };

        let sizes = self.sizes.clone();
        let thumbnails =
            tokio::task::spawn_blocking(move || ThumbnailGenerator::generate_all(&source, &sizes))
                .await
                .unrecoverable()?
                .unrecoverable()?;

        for (size, data) in thumbnails {
            self.content
                .write_derived(job.blob_id, size, &data)
                .await
                .recoverable()?;
            tracing::debug!(size, size_bytes = data.len(), "Thumbnail written");
        }

        Ok(())
    }
}
