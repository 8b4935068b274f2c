use crate::auth::AccessGuard;
use crate::services::{FileService, ListingService, UploadService};
use crate::state::AppState;
use cabinet_core::Config;
use cabinet_db::Stores;
use cabinet_storage::ContentStore;
use cabinet_worker::{ThumbnailQueue, ThumbnailQueueConfig, ThumbnailWorker};
use std::sync::Arc;

/// Build services over ready stores and start the thumbnail worker pool.
pub fn initialize_services(
    config: Config,
    stores: Stores,
    content: Arc<dyn ContentStore>,
) -> Arc<AppState> {
    let timeout = config.store_timeout();
    let guard = Arc::new(AccessGuard::new(stores.tokens.clone(), timeout));

    let worker = ThumbnailWorker::new(
        stores.metadata.clone(),
        content.clone(),
        config.thumbnail_sizes(),
    );
    let queue = ThumbnailQueue::start(worker, ThumbnailQueueConfig::from_config(&config));

    let uploads = UploadService::new(
        stores.metadata.clone(),
        content.clone(),
        guard.clone(),
        queue.clone(),
        timeout,
    );
    let files = FileService::new(
        stores.metadata.clone(),
        content.clone(),
        guard.clone(),
        config.thumbnail_sizes().to_vec(),
        timeout,
    );
    let listing = ListingService::new(stores.metadata.clone(), guard.clone(), timeout);

    tracing::info!(
        sizes = ?config.thumbnail_sizes(),
        store_timeout_secs = timeout.as_secs(),
        "Services initialized"
    );

    Arc::new(AppState {
        config,
        stores,
        content,
        guard,
        queue,
        uploads,
        files,
        listing,
    })
}
