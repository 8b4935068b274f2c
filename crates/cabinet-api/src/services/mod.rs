//! Request-level operations over the stores: upload pipeline, record access and listing.

pub mod files;
pub mod listing;
pub mod upload;

pub use files::FileService;
pub use listing::ListingService;
pub use upload::UploadService;

use cabinet_core::AppError;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// Bound a store call. An elapsed timeout is a storage failure, never a hang.
pub(crate) async fn with_timeout<T, F>(
    timeout: Duration,
    operation: &str,
    fut: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Storage(format!(
            "{} timed out after {}s",
            operation,
            timeout.as_secs_f64()
        ))),
    }
}

/// Path ids that are not UUIDs cannot name a record.
pub(crate) fn parse_record_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(format!("File {} not found", raw)))
}
