//! OpenAPI documentation, served at `/api/openapi.json` and browsable at `/docs`.
//!
//! Authenticated routes expect the session token in the `X-Token` header.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use cabinet_core::{models, HealthStatus};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cabinet API",
        version = "0.1.0",
        description = "Hierarchical file storage with per-record visibility and image thumbnails. Authenticated endpoints expect an `X-Token` header."
    ),
    paths(
        // Users
        handlers::users::create_user,
        handlers::users::get_me,
        // Files
        handlers::upload::upload_file,
        handlers::files::list_files,
        handlers::files::get_file,
        handlers::files::publish_file,
        handlers::files::unpublish_file,
        handlers::file_data::get_file_data,
        // Status
        handlers::status::get_status,
        handlers::status::get_stats,
    ),
    components(
        schemas(
            models::FileKind,
            models::FileResponse,
            models::UploadRequest,
            models::CreateUserRequest,
            models::UserResponse,
            HealthStatus,
            handlers::status::StatusResponse,
            handlers::status::StatsResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "users", description = "Signup and identity"),
        (name = "files", description = "Upload, listing, visibility and content of files and folders"),
        (name = "status", description = "Store health and record counts")
    )
)]
pub struct ApiDoc;
