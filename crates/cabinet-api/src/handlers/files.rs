use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedQuery};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use cabinet_core::models::{FileResponse, ParentRef, Visibility};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListFilesQuery {
    /// `0` (default) for the root, otherwise a folder id
    pub parent_id: Option<String>,
    /// Zero-based page of 20 entries
    #[serde(default)]
    pub page: u32,
}

impl ListFilesQuery {
    /// Absent means root; a value that names no folder lists nothing.
    fn parent(&self) -> Option<ParentRef> {
        match self.parent_id.as_deref() {
            None | Some("") => Some(ParentRef::Root),
            Some(raw) => ParentRef::parse(raw),
        }
    }
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Up to 20 readable children", body = Vec<FileResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListFilesQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let records = state
        .listing
        .list(query.parent(), query.page, Some(&user))
        .await?;

    Ok(Json(
        records
            .into_iter()
            .map(FileResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "File record", body = FileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state.files.get(&id, Some(&user)).await?;
    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    put,
    path = "/files/{id}/publish",
    tag = "files",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "Record is now public", body = FileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn publish_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .files
        .set_visibility(&id, &user, Visibility::Public)
        .await?;
    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    put,
    path = "/files/{id}/unpublish",
    tag = "files",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "Record is now private", body = FileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn unpublish_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .files
        .set_visibility(&id, &user, Visibility::Private)
        .await?;
    Ok(Json(FileResponse::from(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn query(parent_id: Option<&str>) -> ListFilesQuery {
        ListFilesQuery {
            parent_id: parent_id.map(String::from),
            page: 0,
        }
    }

    #[test]
    fn test_parent_query_parsing() {
        assert_eq!(query(None).parent(), Some(ParentRef::Root));
        assert_eq!(query(Some("0")).parent(), Some(ParentRef::Root));
        assert_eq!(query(Some("photos")).parent(), None);

        let id = Uuid::new_v4();
        assert_eq!(
            query(Some(&id.to_string())).parent(),
            Some(ParentRef::Folder(id))
        );
    }
}
