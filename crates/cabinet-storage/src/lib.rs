//! Cabinet Storage Library
//!
//! Content store abstraction and backends. Blobs are addressed by generated ids that
//! are independent of any metadata record.
//!
//! # Key format
//!
//! The layout is flat:
//!
//! - **Original content**: `{blob_id}`
//! - **Derived assets**: `{blob_id}_{size}`
//!
//! Every write is staged under a temporary name and published with a single rename (or
//! map insert), so readers see either the whole payload or nothing.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use cabinet_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use traits::{ContentStore, StorageError, StorageResult};
