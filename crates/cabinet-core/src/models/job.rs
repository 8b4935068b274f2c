use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FileRecord;

/// Work item for the thumbnail worker: one image record and its content pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailJob {
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub blob_id: Uuid,
}

impl ThumbnailJob {
    /// `None` for records without content.
    pub fn for_record(record: &FileRecord) -> Option<Self> {
        record.blob_id.map(|blob_id| ThumbnailJob {
            file_id: record.id,
            user_id: record.user_id,
            blob_id,
        })
    }
}
