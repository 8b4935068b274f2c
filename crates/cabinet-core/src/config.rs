//! Configuration module
//!
//! Settings are read from the environment (after loading `.env`), with a default for
//! everything except the database URL, which is only needed for the postgres backend.

use std::env;
use std::time::Duration;

use crate::storage_types::{MetadataBackend, StorageBackend};

const SERVER_PORT: u16 = 5000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const STORE_TIMEOUT_SECS: u64 = 10;
const MAX_UPLOAD_SIZE_MB: usize = 25;
const FOLDER_PATH: &str = "/tmp/files_manager";
const THUMBNAIL_SIZES: &str = "500,250,100";
const THUMBNAIL_WORKERS: usize = 2;
const THUMBNAIL_QUEUE_SIZE: usize = 1000;
const THUMBNAIL_MAX_ATTEMPTS: u32 = 3;

/// Process-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    /// `compact` (default) or `json`
    pub log_format: String,
}

/// Store, session and worker settings
#[derive(Clone, Debug)]
pub struct CabinetConfig {
    pub base: BaseConfig,
    pub metadata_backend: MetadataBackend,
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    /// Root directory of the local content store
    pub folder_path: String,
    pub session_ttl_secs: u64,
    pub store_timeout_secs: u64,
    pub max_upload_size_bytes: usize,
    pub thumbnail_sizes: Vec<u32>,
    pub thumbnail_workers: usize,
    pub thumbnail_queue_size: usize,
    pub thumbnail_max_attempts: u32,
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                environment: "development".to_string(),
                log_format: "compact".to_string(),
            },
            metadata_backend: MetadataBackend::Memory,
            database_url: None,
            storage_backend: StorageBackend::Local,
            folder_path: FOLDER_PATH.to_string(),
            session_ttl_secs: SESSION_TTL_SECS,
            store_timeout_secs: STORE_TIMEOUT_SECS,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            thumbnail_sizes: parse_sizes(THUMBNAIL_SIZES),
            thumbnail_workers: THUMBNAIL_WORKERS,
            thumbnail_queue_size: THUMBNAIL_QUEUE_SIZE,
            thumbnail_max_attempts: THUMBNAIL_MAX_ATTEMPTS,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<CabinetConfig>);

impl Config {
    fn as_cabinet(&self) -> &CabinetConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = CabinetConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_cabinet().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.as_cabinet().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.as_cabinet().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.as_cabinet().base.log_format
    }

    pub fn server_port(&self) -> u16 {
        self.as_cabinet().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_cabinet().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_cabinet().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_cabinet().base.db_timeout_seconds
    }

    pub fn metadata_backend(&self) -> MetadataBackend {
        self.as_cabinet().metadata_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_cabinet().database_url.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_cabinet().storage_backend
    }

    pub fn folder_path(&self) -> &str {
        &self.as_cabinet().folder_path
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.as_cabinet().session_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.as_cabinet().store_timeout_secs)
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_cabinet().max_upload_size_bytes
    }

    pub fn thumbnail_sizes(&self) -> &[u32] {
        &self.as_cabinet().thumbnail_sizes
    }

    pub fn thumbnail_workers(&self) -> usize {
        self.as_cabinet().thumbnail_workers
    }

    pub fn thumbnail_queue_size(&self) -> usize {
        self.as_cabinet().thumbnail_queue_size
    }

    pub fn thumbnail_max_attempts(&self) -> u32 {
        self.as_cabinet().thumbnail_max_attempts
    }
}

impl CabinetConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .to_lowercase(),
        };

        let metadata_backend = env::var("METADATA_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse::<MetadataBackend>()?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<StorageBackend>()?;

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        Ok(CabinetConfig {
            base,
            metadata_backend,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            storage_backend,
            folder_path: env::var("FOLDER_PATH").unwrap_or_else(|_| FOLDER_PATH.to_string()),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| SESSION_TTL_SECS.to_string())
                .parse()
                .unwrap_or(SESSION_TTL_SECS),
            store_timeout_secs: env::var("STORE_TIMEOUT_SECS")
                .unwrap_or_else(|_| STORE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(STORE_TIMEOUT_SECS),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            thumbnail_sizes: parse_sizes(
                &env::var("THUMBNAIL_SIZES").unwrap_or_else(|_| THUMBNAIL_SIZES.to_string()),
            ),
            thumbnail_workers: env::var("THUMBNAIL_WORKERS")
                .unwrap_or_else(|_| THUMBNAIL_WORKERS.to_string())
                .parse()
                .unwrap_or(THUMBNAIL_WORKERS),
            thumbnail_queue_size: env::var("THUMBNAIL_QUEUE_SIZE")
                .unwrap_or_else(|_| THUMBNAIL_QUEUE_SIZE.to_string())
                .parse()
                .unwrap_or(THUMBNAIL_QUEUE_SIZE),
            thumbnail_max_attempts: env::var("THUMBNAIL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| THUMBNAIL_MAX_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(THUMBNAIL_MAX_ATTEMPTS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.metadata_backend == MetadataBackend::Postgres {
            match self.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                Some(_) => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when METADATA_BACKEND=postgres"
                    ))
                }
            }
        }

        if self.storage_backend == StorageBackend::Local && self.folder_path.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "FOLDER_PATH must be set when using the local storage backend"
            ));
        }

        if self.session_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SESSION_TTL_SECS must be greater than 0"));
        }

        if self.store_timeout_secs == 0 {
            return Err(anyhow::anyhow!("STORE_TIMEOUT_SECS must be greater than 0"));
        }

        if self.thumbnail_sizes.is_empty() {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_SIZES must list at least one positive width"
            ));
        }

        if self.thumbnail_workers == 0 || self.thumbnail_queue_size == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_WORKERS and THUMBNAIL_QUEUE_SIZE must be at least 1"
            ));
        }

        if self.thumbnail_max_attempts == 0 {
            return Err(anyhow::anyhow!("THUMBNAIL_MAX_ATTEMPTS must be at least 1"));
        }

        Ok(())
    }
}

/// Parse a comma separated list of widths, skipping zero and invalid entries.
/// Duplicates are removed; order is kept.
pub fn parse_sizes(value: &str) -> Vec<u32> {
    let mut sizes = Vec::new();
    for size in value
        .split(',')
        .filter_map(|s| s.trim().parse::<u32>().ok())
        .filter(|s| *s > 0)
    {
        if !sizes.contains(&size) {
            sizes.push(size);
        }
    }
    sizes
}
