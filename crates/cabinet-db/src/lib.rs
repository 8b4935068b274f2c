//! Cabinet DB Library
//!
//! Metadata, user and token stores. Each store is a trait with a PostgreSQL
//! implementation and an in-memory one; both honour the same contract.

pub mod db;

pub use db::{
    connect_and_migrate, create_stores, generate_token, hash_password, token_digest,
    verify_password, MemoryMetadataStore, MemoryTokenStore, MemoryUserStore, MetadataStore,
    PostgresMetadataStore, PostgresTokenStore, PostgresUserStore, Stores, TokenStore, UserStore,
    PAGE_SIZE,
};
