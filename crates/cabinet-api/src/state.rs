//! Application state shared by every handler.

use crate::auth::AccessGuard;
use crate::services::{FileService, ListingService, UploadService};
use cabinet_core::Config;
use cabinet_db::Stores;
use cabinet_storage::ContentStore;
use cabinet_worker::ThumbnailQueue;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stores: Stores,
    pub content: Arc<dyn ContentStore>,
    pub guard: Arc<AccessGuard>,
    pub queue: ThumbnailQueue,
    pub uploads: UploadService,
    pub files: FileService,
    pub listing: ListingService,
}
