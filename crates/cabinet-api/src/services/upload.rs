//! Upload pipeline
//!
//! Runs strictly in order: validate fields, resolve the parent, validate content,
//! then write content before metadata. An image job is queued only once both writes
//! have succeeded, so the worker never sees a job for state that does not exist yet.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use cabinet_core::models::{
    FileKind, FileRecord, NewFileRecord, ParentRef, ThumbnailJob, UploadRequest, Visibility,
};
use cabinet_core::AppError;
use cabinet_db::MetadataStore;
use cabinet_storage::ContentStore;
use cabinet_worker::ThumbnailQueue;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use super::with_timeout;
use crate::auth::{AccessGuard, Action, AuthUser};

const PARENT_NOT_FOUND: &str = "Parent not found";
const PARENT_NOT_FOLDER: &str = "Parent is not a folder";

#[derive(Clone)]
pub struct UploadService {
    metadata: Arc<dyn MetadataStore>,
    content: Arc<dyn ContentStore>,
    guard: Arc<AccessGuard>,
    queue: ThumbnailQueue,
    timeout: Duration,
}

/// Upload fields after presence checks.
struct CheckedUpload {
    name: String,
    kind: FileKind,
    visibility: Visibility,
    parent: ParentRef,
    data: Option<String>,
}

impl UploadService {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        content: Arc<dyn ContentStore>,
        guard: Arc<AccessGuard>,
        queue: ThumbnailQueue,
        timeout: Duration,
    ) -> Self {
        Self {
            metadata,
            content,
            guard,
            queue,
            timeout,
        }
    }

    /// Validate and persist one upload for `user`, returning the created record.
    #[tracing::instrument(
        skip(self, request),
        fields(user.id = %user.user_id, file.id = tracing::field::Empty, operation = "upload")
    )]
    pub async fn upload(
        &self,
        user: &AuthUser,
        request: UploadRequest,
    ) -> Result<FileRecord, AppError> {
        let upload = self.check_fields(request)?;
        self.check_parent(user, upload.parent).await?;

        let record = match upload.kind {
            FileKind::Folder => {
                let new_record =
                    NewFileRecord::folder(user.user_id, upload.name, upload.visibility, upload.parent);
                with_timeout(self.timeout, "metadata insert", self.metadata.insert(new_record))
                    .await?
            }
            kind => {
                let data = upload
                    .data
                    .ok_or_else(|| AppError::InvalidInput("Missing data".to_string()))?;
                self.store_with_content(user, upload.name, kind, upload.visibility, upload.parent, &data)
                    .await?
            }
        };

        tracing::Span::current().record("file.id", tracing::field::display(record.id));
        tracing::info!(
            file.id = %record.id,
            kind = %record.kind,
            parent = %record.parent(),
            "File record created"
        );

        if record.kind == FileKind::Image {
            self.enqueue_thumbnails(&record).await;
        }

        Ok(record)
    }

    fn check_fields(&self, request: UploadRequest) -> Result<CheckedUpload, AppError> {
        let name = request
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Missing name".to_string()))?
            .to_string();

        let kind = request
            .kind
            .as_deref()
            .and_then(|kind| kind.parse::<FileKind>().ok())
            .ok_or_else(|| AppError::InvalidInput("Missing type".to_string()))?;

        request.validate()?;

        let parent = match &request.parent_id {
            None => ParentRef::Root,
            Some(raw) => raw
                .to_parent_ref()
                .ok_or_else(|| AppError::InvalidInput(PARENT_NOT_FOUND.to_string()))?,
        };

        let data = request.data.filter(|data| !data.is_empty());

        Ok(CheckedUpload {
            name,
            kind,
            visibility: Visibility::from(request.is_public.unwrap_or(false)),
            parent,
            data,
        })
    }

    /// The parent must be the root or a folder the caller owns. Folders the caller
    /// cannot write to are reported exactly like missing ones.
    async fn check_parent(&self, user: &AuthUser, parent: ParentRef) -> Result<(), AppError> {
        let Some(parent_id) = parent.folder_id() else {
            return Ok(());
        };

        let record = with_timeout(self.timeout, "metadata get", self.metadata.get(parent_id))
            .await?
            .ok_or_else(|| AppError::InvalidInput(PARENT_NOT_FOUND.to_string()))?;

        self.guard
            .authorize(&record, Some(user), Action::Write)
            .map_err(|_| AppError::InvalidInput(PARENT_NOT_FOUND.to_string()))?;

        if record.kind != FileKind::Folder {
            return Err(AppError::InvalidInput(PARENT_NOT_FOLDER.to_string()));
        }

        Ok(())
    }

    async fn store_with_content(
        &self,
        user: &AuthUser,
        name: String,
        kind: FileKind,
        visibility: Visibility,
        parent: ParentRef,
        encoded: &str,
    ) -> Result<FileRecord, AppError> {
        let blob_id = self.content.allocate_id();
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::InvalidInput(format!("Invalid data: {}", e)))?;

        with_timeout(self.timeout, "content write", async {
            self.content
                .write(blob_id, &bytes)
                .await
                .map_err(AppError::from)
        })
        .await?;

        let new_record =
            NewFileRecord::with_content(user.user_id, name, kind, visibility, parent, blob_id);
        match with_timeout(self.timeout, "metadata insert", self.metadata.insert(new_record)).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::warn!(
                    blob.id = %blob_id,
                    size_bytes = bytes.len(),
                    error = %e,
                    "Metadata insert failed after content write, blob is orphaned"
                );
                if e.is_storage() {
                    Err(e)
                } else {
                    Err(AppError::Storage(format!(
                        "Metadata insert failed after content write: {}",
                        e
                    )))
                }
            }
        }
    }

    /// Failure to queue leaves a complete record without thumbnails; the upload
    /// itself still succeeds.
    async fn enqueue_thumbnails(&self, record: &FileRecord) {
        let Some(job) = ThumbnailJob::for_record(record) else {
            return;
        };

        match tokio::time::timeout(self.timeout, self.queue.submit_async(job)).await {
            Ok(Ok(())) => {
                tracing::debug!(file.id = %record.id, "Thumbnail job queued");
            }
            Ok(Err(e)) => {
                tracing::error!(file.id = %record.id, error = %e, "Failed to queue thumbnail job");
            }
            Err(_) => {
                tracing::error!(file.id = %record.id, "Timed out queueing thumbnail job");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabinet_core::models::ParentIdInput;
    use cabinet_db::{MemoryMetadataStore, MemoryTokenStore};
    use cabinet_storage::MemoryStorage;
    use uuid::Uuid;

    struct Fixture {
        service: UploadService,
        metadata: Arc<MemoryMetadataStore>,
        content: Arc<MemoryStorage>,
        user: AuthUser,
    }

    fn fixture() -> Fixture {
        let metadata = Arc::new(MemoryMetadataStore::new());
        let content = Arc::new(MemoryStorage::new());
        let guard = Arc::new(AccessGuard::new(
            Arc::new(MemoryTokenStore::new()),
            Duration::from_secs(1),
        ));
        let service = UploadService::new(
            metadata.clone(),
            content.clone(),
            guard,
            ThumbnailQueue::dummy(),
            Duration::from_secs(1),
        );
        Fixture {
            service,
            metadata,
            content,
            user: AuthUser {
                user_id: Uuid::new_v4(),
            },
        }
    }

    fn request(name: &str, kind: &str) -> UploadRequest {
        UploadRequest {
            name: Some(name.to_string()),
            kind: Some(kind.to_string()),
            ..Default::default()
        }
    }

    async fn error_message(f: &Fixture, req: UploadRequest) -> String {
        match f.service.upload(&f.user, req).await {
            Err(AppError::InvalidInput(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_folder_upload_defaults() {
        let f = fixture();
        let record = f.service.upload(&f.user, request("Photos", "folder")).await.unwrap();

        assert_eq!(record.kind, FileKind::Folder);
        assert!(!record.is_public);
        assert_eq!(record.parent(), ParentRef::Root);
        assert!(record.blob_id.is_none());
        assert!(f.content.is_empty().await);
    }

    #[tokio::test]
    async fn test_file_bytes_are_stored_decoded() {
        let f = fixture();
        let raw = vec![0u8, 1, 2, 254, 255];
        let mut req = request("blob.bin", "file");
        req.data = Some(STANDARD.encode(&raw));
        req.is_public = Some(true);

        let record = f.service.upload(&f.user, req).await.unwrap();
        assert!(record.is_public);
        let blob_id = record.blob_id.unwrap();
        assert_eq!(f.content.read(blob_id, None).await.unwrap(), raw);
    }

    #[tokio::test]
    async fn test_field_validation_order() {
        let f = fixture();

        let mut req = request("", "file");
        req.kind = None;
        assert_eq!(error_message(&f, req).await, "Missing name");

        let mut req = request("a", "file");
        req.kind = None;
        assert_eq!(error_message(&f, req).await, "Missing type");

        assert_eq!(error_message(&f, request("a", "video")).await, "Missing type");
        assert_eq!(error_message(&f, request("a", "file")).await, "Missing data");

        let mut req = request("a", "image");
        req.data = Some("%%%not base64".to_string());
        assert!(error_message(&f, req).await.starts_with("Invalid data"));

        assert!(f.content.is_empty().await);
    }

    #[tokio::test]
    async fn test_parent_checks_precede_data_check() {
        let f = fixture();

        let mut req = request("a", "file");
        req.parent_id = Some(ParentIdInput::Text(Uuid::new_v4().to_string()));
        assert_eq!(error_message(&f, req).await, PARENT_NOT_FOUND);

        let mut req = request("a", "file");
        req.parent_id = Some(ParentIdInput::Text("not-an-id".to_string()));
        assert_eq!(error_message(&f, req).await, PARENT_NOT_FOUND);

        let mut file = request("a.txt", "file");
        file.data = Some(STANDARD.encode(b"hello"));
        let file = f.service.upload(&f.user, file).await.unwrap();

        let mut req = request("b", "file");
        req.parent_id = Some(ParentIdInput::Text(file.id.to_string()));
        assert_eq!(error_message(&f, req).await, PARENT_NOT_FOLDER);
    }

    #[tokio::test]
    async fn test_foreign_folder_is_reported_as_missing() {
        let f = fixture();
        let folder = f.service.upload(&f.user, request("Shared", "folder")).await.unwrap();

        let stranger = AuthUser {
            user_id: Uuid::new_v4(),
        };
        let mut req = request("intruder", "folder");
        req.parent_id = Some(ParentIdInput::Text(folder.id.to_string()));
        match f.service.upload(&stranger, req).await {
            Err(AppError::InvalidInput(msg)) => assert_eq!(msg, PARENT_NOT_FOUND),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(f.metadata.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_image_upload_succeeds_without_worker_pool() {
        let f = fixture();
        let mut req = request("cat.png", "image");
        req.data = Some(STANDARD.encode(b"not really a png"));

        let record = f.service.upload(&f.user, req).await.unwrap();
        assert_eq!(record.kind, FileKind::Image);
        assert_eq!(f.content.len().await, 1);
    }

    /// Metadata store whose inserts always hit a constraint violation.
    struct RejectingMetadataStore;

    #[async_trait::async_trait]
    impl MetadataStore for RejectingMetadataStore {
        async fn insert(&self, _record: NewFileRecord) -> Result<FileRecord, AppError> {
            Err(AppError::Conflict("Record violates a store constraint".to_string()))
        }

        async fn get(&self, _id: Uuid) -> Result<Option<FileRecord>, AppError> {
            Ok(None)
        }

        async fn update_visibility(
            &self,
            _id: Uuid,
            _visibility: Visibility,
        ) -> Result<Option<FileRecord>, AppError> {
            Ok(None)
        }

        async fn find_children(
            &self,
            _parent: ParentRef,
            _page: u32,
        ) -> Result<Vec<FileRecord>, AppError> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<i64, AppError> {
            Ok(0)
        }

        async fn health(&self) -> cabinet_core::HealthStatus {
            cabinet_core::HealthStatus::Connected
        }
    }

    #[tokio::test]
    async fn test_insert_failure_after_content_write_is_storage_error() {
        use cabinet_core::ErrorMetadata;

        let content = Arc::new(MemoryStorage::new());
        let service = UploadService::new(
            Arc::new(RejectingMetadataStore),
            content.clone(),
            Arc::new(AccessGuard::new(
                Arc::new(MemoryTokenStore::new()),
                Duration::from_secs(1),
            )),
            ThumbnailQueue::dummy(),
            Duration::from_secs(1),
        );
        let user = AuthUser {
            user_id: Uuid::new_v4(),
        };
        let mut req = request("notes.txt", "file");
        req.data = Some(STANDARD.encode(b"hello"));

        let err = service.upload(&user, req).await.unwrap_err();
        assert!(err.is_storage(), "got {:?}", err);
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(content.len().await, 1);
    }

    #[tokio::test]
    async fn test_nested_upload_links_parent() {
        let f = fixture();
        let folder = f.service.upload(&f.user, request("Photos", "folder")).await.unwrap();

        let mut req = request("cat.png", "image");
        req.parent_id = Some(ParentIdInput::Text(folder.id.to_string()));
        req.data = Some(STANDARD.encode(b"bytes"));
        let child = f.service.upload(&f.user, req).await.unwrap();

        assert_eq!(child.parent(), ParentRef::Folder(folder.id));
        let children = f
            .metadata
            .find_children(ParentRef::Folder(folder.id), 0)
            .await
            .unwrap();
        assert_eq!(children, vec![child]);
    }
}
