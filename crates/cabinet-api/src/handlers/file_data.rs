use crate::auth::MaybeAuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedQuery};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use cabinet_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileDataQuery {
    /// Width of a derived thumbnail; omit for the original content
    pub size: Option<u32>,
}

/// Content type from the record name, `application/octet-stream` when unknown.
fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

#[utoipa::path(
    get,
    path = "/files/{id}/data",
    tag = "files",
    params(
        ("id" = String, Path, description = "File id"),
        FileDataQuery
    ),
    responses(
        (status = 200, description = "Raw content with a Content-Type guessed from the name"),
        (status = 400, description = "Folder or unsupported size", body = ErrorResponse),
        (status = 404, description = "File or derived size not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, identity), fields(operation = "get_file_data"))]
pub async fn get_file_data(
    State(state): State<Arc<AppState>>,
    identity: MaybeAuthUser,
    Path(id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<FileDataQuery>,
) -> Result<Response, HttpAppError> {
    let (record, data) = state
        .files
        .read_content(&id, identity.as_ref(), query.size)
        .await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&record.name))
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })
}
