//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::auth::{auth_middleware, optional_auth_middleware};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use cabinet_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let config = &state.config;
    let cors = setup_cors(config)?;

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        state.guard.clone(),
        auth_middleware,
    ));
    let content_routes = content_routes().layer(axum::middleware::from_fn_with_state(
        state.guard.clone(),
        optional_auth_middleware,
    ));

    tracing::info!(
        max_upload_size_bytes = config.max_upload_size_bytes(),
        cors_origins = %config.cors_origins().join(","),
        "HTTP routes configured"
    );

    let app = public_routes()
        .merge(protected_routes)
        .merge(content_routes)
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes()))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(handlers::users::create_user))
        .route("/status", get(handlers::status::get_status))
        .route("/stats", get(handlers::status::get_stats))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(handlers::users::get_me))
        .route("/upload", post(handlers::upload::upload_file))
        .route("/files", get(handlers::files::list_files))
        .route("/files/{id}", get(handlers::files::get_file))
        .route("/files/{id}/publish", put(handlers::files::publish_file))
        .route("/files/{id}/unpublish", put(handlers::files::unpublish_file))
}

/// Readable by anyone when the record is public; a token unlocks private records.
fn content_routes() -> Router<Arc<AppState>> {
    Router::new().route("/files/{id}/data", get(handlers::file_data::get_file_data))
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
