use cabinet_core::models::{FileRecord, ParentRef};
use cabinet_core::AppError;
use cabinet_db::MetadataStore;
use std::sync::Arc;
use std::time::Duration;

use super::with_timeout;
use crate::auth::{AccessGuard, AuthUser};

/// Paginated, access-filtered children of a folder.
#[derive(Clone)]
pub struct ListingService {
    metadata: Arc<dyn MetadataStore>,
    guard: Arc<AccessGuard>,
    timeout: Duration,
}

impl ListingService {
    pub fn new(metadata: Arc<dyn MetadataStore>, guard: Arc<AccessGuard>, timeout: Duration) -> Self {
        Self {
            metadata,
            guard,
            timeout,
        }
    }

    /// One page of children the caller may read. `None` names no folder and lists nothing.
    ///
    /// Filtering happens after paging, so a page may hold fewer entries than the page size.
    #[tracing::instrument(skip(self, identity), fields(operation = "list_files"))]
    pub async fn list(
        &self,
        parent: Option<ParentRef>,
        page: u32,
        identity: Option<&AuthUser>,
    ) -> Result<Vec<FileRecord>, AppError> {
        let Some(parent) = parent else {
            return Ok(Vec::new());
        };

        let children = with_timeout(
            self.timeout,
            "metadata find_children",
            self.metadata.find_children(parent, page),
        )
        .await?;

        let fetched = children.len();
        let visible: Vec<FileRecord> = children
            .into_iter()
            .filter(|record| self.guard.can_read(record, identity))
            .collect();

        tracing::debug!(
            parent = %parent,
            page,
            fetched,
            visible = visible.len(),
            "Listed folder children"
        );

        Ok(visible)
    }
}
