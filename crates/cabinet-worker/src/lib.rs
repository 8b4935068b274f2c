//! Cabinet Worker Library
//!
//! Bounded in-process queue of thumbnail jobs and the worker pool consuming it.
//! Uploads enqueue; the pool derives thumbnails off the request path.

pub mod queue;
pub mod worker;

pub use queue::{ThumbnailQueue, ThumbnailQueueConfig, MAX_RETRY_BACKOFF};
pub use worker::ThumbnailWorker;
