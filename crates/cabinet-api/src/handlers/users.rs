use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::with_timeout;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use cabinet_core::models::{CreateUserRequest, UserResponse};
use cabinet_core::AppError;
use cabinet_db::{hash_password, UserStore};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Missing field or email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "create_user"))]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = request
        .email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing email".to_string()))?;
    let password = request
        .password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing password".to_string()))?;

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

    let user = with_timeout(
        state.config.store_timeout(),
        "user insert",
        state.stores.users.create(&email, &password_hash),
    )
    .await?;
    tracing::info!(user.id = %user.id, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Identity behind the token", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user.id = %user.user_id, operation = "get_me"))]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, HttpAppError> {
    // A live token for a deleted account is as good as no token.
    let account = with_timeout(
        state.config.store_timeout(),
        "user lookup",
        state.stores.users.get(user.user_id),
    )
    .await?
    .ok_or_else(|| AppError::Unauthorized("Token owner no longer exists".to_string()))?;

    Ok(Json(UserResponse::from(account)))
}
