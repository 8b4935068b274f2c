use crate::auth::guard::{extract_token, AccessGuard};
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cabinet_core::AppError;
use std::sync::Arc;

/// Require a valid session token; the resolved identity is stored in request extensions.
pub async fn auth_middleware(
    State(guard): State<Arc<AccessGuard>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(request.headers()).map(str::to_owned);

    match guard.authenticate(token.as_deref()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}

/// Attach an identity when a valid token is present and continue anonymously otherwise.
/// An unreachable token store still fails the request.
pub async fn optional_auth_middleware(
    State(guard): State<Arc<AccessGuard>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(request.headers()).map(str::to_owned);

    if token.is_some() {
        match guard.authenticate(token.as_deref()).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized(reason)) => {
                tracing::debug!(reason = %reason, "Ignoring invalid token on public route");
            }
            Err(e) => return HttpAppError(e).into_response(),
        }
    }

    next.run(request).await
}
