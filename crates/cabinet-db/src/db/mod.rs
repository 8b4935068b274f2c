//! Store implementations
//!
//! `files`, `users` and `sessions` hold one trait each plus its PostgreSQL repository.
//! `memory` holds the in-process implementations used in development and tests.
//
// Metadata store (file and folder records)
pub mod files;
//
// User store
pub mod users;
//
// Token store
pub mod sessions;
//
// Password hashing for the user store
pub mod password;
//
// In-memory implementations
pub mod memory;
//
// Backend selection and pool setup
pub mod factory;

pub use factory::{connect_and_migrate, create_stores, Stores};
pub use files::{MetadataStore, PostgresMetadataStore, PAGE_SIZE};
pub use memory::{MemoryMetadataStore, MemoryTokenStore, MemoryUserStore};
pub use password::{hash_password, verify_password};
pub use sessions::{generate_token, token_digest, PostgresTokenStore, TokenStore};
pub use users::{PostgresUserStore, UserStore};

use cabinet_core::AppError;

/// Map store-level constraint violations to `Conflict`; everything else stays a
/// database error.
pub(crate) fn map_constraint_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation()
                || db_err.is_foreign_key_violation()
                || db_err.is_check_violation() =>
        {
            tracing::debug!(error = %db_err, "Store constraint violation");
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
