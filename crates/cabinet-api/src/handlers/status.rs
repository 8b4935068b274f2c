//! Store liveness and record counts.

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::with_timeout;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use cabinet_core::HealthStatus;
use cabinet_db::{MetadataStore, TokenStore, UserStore};
use cabinet_storage::ContentStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub metadata: HealthStatus,
    pub tokens: HealthStatus,
    pub content: HealthStatus,
}

impl StatusResponse {
    pub fn is_healthy(&self) -> bool {
        self.metadata.is_connected() && self.tokens.is_connected() && self.content.is_connected()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub users: i64,
    pub files: i64,
}

/// A check that does not answer in time counts as disconnected.
async fn run_check<F>(timeout: Duration, check: F) -> HealthStatus
where
    F: std::future::Future<Output = HealthStatus>,
{
    tokio::time::timeout(timeout, check)
        .await
        .unwrap_or(HealthStatus::Disconnected)
}

#[utoipa::path(
    get,
    path = "/status",
    tag = "status",
    responses(
        (status = 200, description = "All stores connected", body = StatusResponse),
        (status = 503, description = "At least one store disconnected", body = StatusResponse)
    )
)]
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timeout = state.config.store_timeout();
    let (metadata, tokens, content) = tokio::join!(
        run_check(timeout, state.stores.metadata.health()),
        run_check(timeout, state.stores.tokens.health()),
        run_check(timeout, state.content.health()),
    );

    let status = StatusResponse {
        metadata,
        tokens,
        content,
    };

    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        tracing::warn!(
            metadata = %status.metadata,
            tokens = %status.tokens,
            content = %status.content,
            "Store health check failed"
        );
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "status",
    responses(
        (status = 200, description = "Record counts", body = StatsResponse),
        (status = 500, description = "Metadata store failure", body = ErrorResponse)
    )
)]
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let timeout = state.config.store_timeout();
    let (users, files) = tokio::try_join!(
        with_timeout(timeout, "user count", state.stores.users.count()),
        with_timeout(timeout, "file count", state.stores.metadata.count()),
    )?;
    Ok(Json(StatsResponse { users, files }))
}
