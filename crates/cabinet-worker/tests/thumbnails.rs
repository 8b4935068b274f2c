use async_trait::async_trait;
use cabinet_core::models::{FileKind, FileRecord, NewFileRecord, ParentRef, ThumbnailJob, Visibility};
use cabinet_core::HealthStatus;
use cabinet_db::{MemoryMetadataStore, MetadataStore};
use cabinet_storage::{
    ContentStore, MemoryStorage, StorageBackend, StorageError, StorageResult,
};
use cabinet_worker::{ThumbnailQueue, ThumbnailQueueConfig, ThumbnailWorker};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SIZES: [u32; 3] = [500, 250, 100];

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 128, 255])
    });
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

async fn image_record(
    metadata: &MemoryMetadataStore,
    content: &dyn ContentStore,
    data: &[u8],
) -> FileRecord {
    let blob_id = content.allocate_id();
    content.write(blob_id, data).await.unwrap();
    metadata
        .insert(NewFileRecord::with_content(
            Uuid::new_v4(),
            "cat.png".to_string(),
            FileKind::Image,
            Visibility::Private,
            ParentRef::Root,
            blob_id,
        ))
        .await
        .unwrap()
}

fn fast_config() -> ThumbnailQueueConfig {
    ThumbnailQueueConfig {
        max_workers: 2,
        queue_size: 8,
        max_attempts: 3,
        base_backoff: Duration::from_millis(1),
    }
}

async fn wait_for_derived(content: &dyn ContentStore, blob_id: Uuid, size: u32) -> Vec<u8> {
    for _ in 0..500 {
        if let Ok(data) = content.read(blob_id, Some(size)).await {
            return data;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("derived asset {}_{} never appeared", blob_id, size);
}

#[tokio::test]
async fn worker_writes_every_size_and_is_idempotent() {
    let metadata = MemoryMetadataStore::new();
    let content = MemoryStorage::new();
    let record = image_record(&metadata, &content, &png(800, 600)).await;
    let job = ThumbnailJob::for_record(&record).unwrap();

    let worker = ThumbnailWorker::new(
        Arc::new(metadata.clone()),
        Arc::new(content.clone()),
        &SIZES,
    );

    worker.process(job).await.unwrap();
    let mut first = Vec::new();
    for size in SIZES {
        let data = content.read(job.blob_id, Some(size)).await.unwrap();
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.width(), size);
        first.push(data);
    }

    worker.process(job).await.unwrap();
    for (size, expected) in SIZES.iter().zip(&first) {
        assert_eq!(&content.read(job.blob_id, Some(*size)).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn missing_source_is_dropped_as_unrecoverable() {
    let metadata = MemoryMetadataStore::new();
    let content = MemoryStorage::new();
    let record = metadata
        .insert(NewFileRecord::with_content(
            Uuid::new_v4(),
            "gone.png".to_string(),
            FileKind::Image,
            Visibility::Public,
            ParentRef::Root,
            Uuid::new_v4(),
        ))
        .await
        .unwrap();

    let worker = ThumbnailWorker::new(Arc::new(metadata), Arc::new(content), &SIZES);
    let err = worker
        .process(ThumbnailJob::for_record(&record).unwrap())
        .await
        .unwrap_err();
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn job_for_unknown_or_foreign_record_is_unrecoverable() {
    let metadata = MemoryMetadataStore::new();
    let content = MemoryStorage::new();
    let record = image_record(&metadata, &content, &png(50, 50)).await;
    let worker = ThumbnailWorker::new(
        Arc::new(metadata.clone()),
        Arc::new(content.clone()),
        &SIZES,
    );

    let unknown = ThumbnailJob {
        file_id: Uuid::new_v4(),
        ..ThumbnailJob::for_record(&record).unwrap()
    };
    assert!(!worker.process(unknown).await.unwrap_err().is_recoverable());

    let foreign = ThumbnailJob {
        user_id: Uuid::new_v4(),
        ..ThumbnailJob::for_record(&record).unwrap()
    };
    assert!(!worker.process(foreign).await.unwrap_err().is_recoverable());
}

#[tokio::test]
async fn pool_survives_failing_jobs() {
    let metadata = MemoryMetadataStore::new();
    let content = MemoryStorage::new();
    let worker = ThumbnailWorker::new(
        Arc::new(metadata.clone()),
        Arc::new(content.clone()),
        &SIZES,
    );
    let queue = ThumbnailQueue::start(worker, fast_config());

    // Undecodable content, then a job for a record that does not exist.
    let broken = image_record(&metadata, &content, b"not an image").await;
    queue
        .submit_async(ThumbnailJob::for_record(&broken).unwrap())
        .await
        .unwrap();
    queue
        .submit_async(ThumbnailJob {
            file_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            blob_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let good = image_record(&metadata, &content, &png(300, 300)).await;
    queue
        .submit_async(ThumbnailJob::for_record(&good).unwrap())
        .await
        .unwrap();

    let thumb = wait_for_derived(&content, good.blob_id.unwrap(), 100).await;
    assert_eq!(image::load_from_memory(&thumb).unwrap().width(), 100);
    assert!(content.read(broken.blob_id.unwrap(), Some(100)).await.is_err());
}

/// Content store whose reads fail a fixed number of times before succeeding.
struct FlakyStorage {
    inner: MemoryStorage,
    failures_left: AtomicU32,
    reads: AtomicU32,
}

#[async_trait]
impl ContentStore for FlakyStorage {
    async fn write(&self, blob_id: Uuid, data: &[u8]) -> StorageResult<()> {
        self.inner.write(blob_id, data).await
    }

    async fn write_derived(&self, blob_id: Uuid, size: u32, data: &[u8]) -> StorageResult<()> {
        self.inner.write_derived(blob_id, size, data).await
    }

    async fn read(&self, blob_id: Uuid, size: Option<u32>) -> StorageResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StorageError::BackendError("disk hiccup".to_string()));
        }
        self.inner.read(blob_id, size).await
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus::Connected
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[tokio::test]
async fn recoverable_failures_are_retried_within_budget() {
    let metadata = MemoryMetadataStore::new();
    let flaky = Arc::new(FlakyStorage {
        inner: MemoryStorage::new(),
        failures_left: AtomicU32::new(2),
        reads: AtomicU32::new(0),
    });
    let record = image_record(&metadata, flaky.inner_ref(), &png(400, 200)).await;

    let worker = ThumbnailWorker::new(Arc::new(metadata), flaky.clone(), &SIZES);
    let queue = ThumbnailQueue::start(worker, fast_config());
    queue
        .submit_async(ThumbnailJob::for_record(&record).unwrap())
        .await
        .unwrap();

    wait_for_derived(&flaky.inner, record.blob_id.unwrap(), 250).await;
    assert_eq!(flaky.reads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn persistent_failures_stop_after_max_attempts() {
    let metadata = MemoryMetadataStore::new();
    let flaky = Arc::new(FlakyStorage {
        inner: MemoryStorage::new(),
        failures_left: AtomicU32::new(u32::MAX),
        reads: AtomicU32::new(0),
    });
    let record = image_record(&metadata, flaky.inner_ref(), &png(10, 10)).await;

    let worker = ThumbnailWorker::new(Arc::new(metadata), flaky.clone(), &SIZES);
    let queue = ThumbnailQueue::start(worker, fast_config());
    queue
        .submit_async(ThumbnailJob::for_record(&record).unwrap())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(flaky.reads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn dummy_queue_rejects_jobs() {
    let queue = ThumbnailQueue::dummy();
    let job = ThumbnailJob {
        file_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        blob_id: Uuid::new_v4(),
    };
    assert!(queue.submit_async(job).await.is_err());
}

impl FlakyStorage {
    fn inner_ref(&self) -> &dyn ContentStore {
        &self.inner
    }
}
