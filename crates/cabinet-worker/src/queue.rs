//! Thumbnail job queue: bounded channel, worker pool and bounded retry.
//!
//! Delivery is at-least-once in intent; a job that keeps failing is dropped after
//! `max_attempts` so a poison job cannot occupy the pool forever.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

use cabinet_core::models::ThumbnailJob;
use cabinet_core::{Config, TaskError};

use crate::worker::ThumbnailWorker;

/// Maximum delay before retrying a failed job. Caps exponential backoff.
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(300);

/// Backoff before retry number `retry_count` (exponential with cap).
#[inline]
pub(crate) fn compute_retry_backoff(base: Duration, retry_count: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(retry_count))
        .min(MAX_RETRY_BACKOFF)
}

#[derive(Clone, Debug)]
pub struct ThumbnailQueueConfig {
    pub max_workers: usize,
    pub queue_size: usize,
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for ThumbnailQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 2,
            queue_size: 1000,
            max_attempts: 3,
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl ThumbnailQueueConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_workers: config.thumbnail_workers(),
            queue_size: config.thumbnail_queue_size(),
            max_attempts: config.thumbnail_max_attempts(),
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct ThumbnailQueue {
    tx: mpsc::Sender<ThumbnailJob>,
}

impl ThumbnailQueue {
    /// Create the bounded channel and spawn the worker pool consuming it.
    ///
    /// The pool runs until every sender is dropped.
    pub fn start(worker: ThumbnailWorker, config: ThumbnailQueueConfig) -> Self {
        let queue_size = config.queue_size.max(1);
        let (tx, rx) = mpsc::channel(queue_size);

        tracing::info!(
            queue_size = queue_size,
            max_workers = config.max_workers,
            max_attempts = config.max_attempts,
            sizes = ?worker.sizes(),
            "Thumbnail job queue initialized with bounded channel"
        );

        tokio::spawn(async move {
            Self::worker_pool(rx, Arc::new(worker), config).await;
        });

        Self { tx }
    }

    /// Queue without a pool; every submission fails.
    pub fn dummy() -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self { tx }
    }

    /// Submit a job, waiting for capacity when the queue is full.
    #[tracing::instrument(skip(self), fields(job.type = "thumbnail", file.id = %job.file_id))]
    pub async fn submit_async(&self, job: ThumbnailJob) -> Result<()> {
        tracing::debug!(blob_id = %job.blob_id, "Enqueuing thumbnail job");
        self.tx
            .send(job)
            .await
            .map_err(|_| anyhow::anyhow!("Thumbnail worker pool is not running"))
    }

    async fn worker_pool(
        mut rx: mpsc::Receiver<ThumbnailJob>,
        worker: Arc<ThumbnailWorker>,
        config: ThumbnailQueueConfig,
    ) {
        let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));

        while let Some(job) = rx.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let worker = worker.clone();
            let config = config.clone();

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = Self::run_job(&worker, job, &config).await {
                    tracing::error!(
                        file_id = %job.file_id,
                        error = %e,
                        recoverable = e.is_recoverable(),
                        "Thumbnail job dropped"
                    );
                }
            });
        }

        tracing::info!("Thumbnail job queue closed, worker pool stopping");
    }

    /// Run a job, retrying recoverable failures up to `max_attempts` in total.
    #[tracing::instrument(skip(worker, config), fields(file.id = %job.file_id, job.status = tracing::field::Empty))]
    async fn run_job(
        worker: &ThumbnailWorker,
        job: ThumbnailJob,
        config: &ThumbnailQueueConfig,
    ) -> Result<(), TaskError> {
        let start = std::time::Instant::now();
        let max_attempts = config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match worker.process(job).await {
                Ok(()) => {
                    tracing::Span::current().record("job.status", "success");
                    tracing::info!(
                        attempt,
                        duration_ms = start.elapsed().as_millis(),
                        "Thumbnails generated"
                    );
                    return Ok(());
                }
                Err(e) if e.is_recoverable() && attempt < max_attempts => {
                    let backoff = compute_retry_backoff(config.base_backoff, attempt - 1);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis(),
                        error = %e,
                        "Thumbnail job failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::Span::current().record("job.status", "failed");
                    return Err(e);
                }
            }
        }
    }
}
