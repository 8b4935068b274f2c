//! Shared key generation for content store backends.

use uuid::Uuid;

/// Key of the original content for `blob_id`.
pub fn blob_key(blob_id: Uuid) -> String {
    blob_id.to_string()
}

/// Key of the derived asset of `blob_id` at `size`: `{blob_id}_{size}`.
pub fn derived_key(blob_id: Uuid, size: u32) -> String {
    format!("{}_{}", blob_id, size)
}

/// Key for an optional size, as used by reads.
pub fn content_key(blob_id: Uuid, size: Option<u32>) -> String {
    match size {
        Some(size) => derived_key(blob_id, size),
        None => blob_key(blob_id),
    }
}
