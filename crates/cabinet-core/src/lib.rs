//! Cabinet Core Library
//!
//! Domain models, error types and configuration shared by every cabinet crate.

pub mod config;
pub mod error;
pub mod health;
pub mod models;
pub mod storage_types;
pub mod task_error;

// Re-export commonly used types
pub use config::{BaseConfig, CabinetConfig, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use health::HealthStatus;
pub use storage_types::{MetadataBackend, StorageBackend};
pub use task_error::{TaskError, TaskResultExt};
