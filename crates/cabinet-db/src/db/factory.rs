//! Store construction
//!
//! Stores are built once at startup and handed out as ready handles. For PostgreSQL
//! that means the pool is connected and migrations have run before anything else
//! observes the stores.

use anyhow::{Context, Result};
use cabinet_core::{Config, MetadataBackend};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::files::{MetadataStore, PostgresMetadataStore};
use super::memory::{MemoryMetadataStore, MemoryTokenStore, MemoryUserStore};
use super::sessions::{PostgresTokenStore, TokenStore};
use super::users::{PostgresUserStore, UserStore};

/// The metadata, user and token stores. They always share one backend.
#[derive(Clone)]
pub struct Stores {
    pub metadata: Arc<dyn MetadataStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            metadata: Arc::new(PostgresMetadataStore::new(pool.clone())),
            users: Arc::new(PostgresUserStore::new(pool.clone())),
            tokens: Arc::new(PostgresTokenStore::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self {
            metadata: Arc::new(MemoryMetadataStore::new()),
            users: Arc::new(MemoryUserStore::new()),
            tokens: Arc::new(MemoryTokenStore::new()),
        }
    }
}

/// Connect the PostgreSQL pool and run pending migrations.
pub async fn connect_and_migrate(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url()
        .context("DATABASE_URL must be set when METADATA_BACKEND=postgres")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    // Workspace migrations/ relative to this crate
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Build the stores for the configured backend.
pub async fn create_stores(config: &Config) -> Result<Stores> {
    match config.metadata_backend() {
        MetadataBackend::Postgres => {
            let pool = connect_and_migrate(config).await?;
            Ok(Stores::postgres(pool))
        }
        MetadataBackend::Memory => {
            tracing::warn!("Using in-memory metadata, user and token stores; state is lost on restart");
            Ok(Stores::memory())
        }
    }
}
