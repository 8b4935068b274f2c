//! Test helpers: build the full router over in-memory metadata stores and a
//! temp-dir local content store.
//!
//! Run from workspace root: `cargo test -p cabinet-api`.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use cabinet_api::{build_app, AppState};
use cabinet_core::{BaseConfig, CabinetConfig, Config, MetadataBackend, StorageBackend};
use cabinet_db::Stores;
use cabinet_storage::{ContentStore, LocalStorage};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn folder_path(&self) -> &Path {
        self._temp_dir.path()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_stores(Stores::memory(), 5).await
}

/// Same as `setup_test_app`, over caller-provided stores and store timeout.
pub async fn setup_test_app_with_stores(stores: Stores, store_timeout_secs: u64) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(temp_dir.path());
    config.0.store_timeout_secs = store_timeout_secs;

    let content: Arc<dyn ContentStore> = Arc::new(
        LocalStorage::new(temp_dir.path())
            .await
            .expect("Failed to create local storage"),
    );

    let (state, app) =
        build_app(config, stores, content).expect("Failed to build application");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

fn create_test_config(folder_path: &Path) -> Config {
    let base = BaseConfig {
        server_port: 5000,
        cors_origins: vec!["*".to_string()],
        db_max_connections: 5,
        db_timeout_seconds: 5,
        environment: "test".to_string(),
        log_format: "compact".to_string(),
    };
    Config(Box::new(CabinetConfig {
        base,
        metadata_backend: MetadataBackend::Memory,
        database_url: None,
        storage_backend: StorageBackend::Local,
        folder_path: folder_path.display().to_string(),
        session_ttl_secs: 3600,
        store_timeout_secs: 5,
        max_upload_size_bytes: 10 * 1024 * 1024,
        thumbnail_sizes: vec![500, 250, 100],
        thumbnail_workers: 2,
        thumbnail_queue_size: 16,
        thumbnail_max_attempts: 3,
    }))
}

/// Poll `GET {path}` until it answers 200 or the attempts run out.
pub async fn wait_for_ok(client: &TestServer, path: &str, token: &str) -> Option<Vec<u8>> {
    for _ in 0..100 {
        let response = client.get(path).add_header("X-Token", token.to_string()).await;
        if response.status_code() == 200 {
            return Some(response.as_bytes().to_vec());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    None
}
