use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use cabinet_core::models::{FileResponse, UploadRequest};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    request_body = UploadRequest,
    responses(
        (status = 201, description = "Record created", body = FileResponse),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Storage failure, retry the upload", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state.uploads.upload(&user, request).await?;
    Ok((StatusCode::CREATED, Json(FileResponse::from(record))))
}
