//! Access control guard
//!
//! Authentication delegates to the token store. Authorization never distinguishes
//! "forbidden" from "absent": a caller that may not see a record gets `NotFound`.

use axum::http::HeaderMap;
use cabinet_core::models::FileRecord;
use cabinet_core::AppError;
use cabinet_db::TokenStore;
use std::sync::Arc;
use std::time::Duration;

use super::models::AuthUser;

pub const TOKEN_HEADER: &str = "x-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

/// Session token from `X-Token`, falling back to `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token);
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[derive(Clone)]
pub struct AccessGuard {
    tokens: Arc<dyn TokenStore>,
    timeout: Duration,
}

impl AccessGuard {
    pub fn new(tokens: Arc<dyn TokenStore>, timeout: Duration) -> Self {
        Self { tokens, timeout }
    }

    /// Resolve a token to an identity.
    ///
    /// Absent, unknown and expired tokens are `Unauthorized`. A token store that
    /// fails or does not answer in time is `Unavailable`, never an invalid token.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AuthUser, AppError> {
        let token =
            token.ok_or_else(|| AppError::Unauthorized("Missing session token".to_string()))?;

        let resolved = tokio::time::timeout(self.timeout, self.tokens.resolve(token))
            .await
            .map_err(|_| AppError::Unavailable("Token store timed out".to_string()))?;

        let user_id = match resolved {
            Ok(user_id) => user_id,
            Err(e @ AppError::Unavailable(_)) => return Err(e),
            Err(e) => return Err(AppError::Unavailable(e.to_string())),
        };

        user_id
            .map(|user_id| AuthUser { user_id })
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
    }

    /// Owners may do anything with their records; everyone else may only read
    /// public ones. Every refusal is `NotFound`.
    pub fn authorize(
        &self,
        record: &FileRecord,
        identity: Option<&AuthUser>,
        action: Action,
    ) -> Result<(), AppError> {
        if is_allowed(record, identity, action) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("File {} not found", record.id)))
        }
    }

    pub fn can_read(&self, record: &FileRecord, identity: Option<&AuthUser>) -> bool {
        is_allowed(record, identity, Action::Read)
    }
}

fn is_allowed(record: &FileRecord, identity: Option<&AuthUser>, action: Action) -> bool {
    if identity.is_some_and(|user| record.is_owned_by(user.user_id)) {
        return true;
    }
    action == Action::Read && record.is_public
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use cabinet_core::models::{FileKind, NewFileRecord, ParentRef, Visibility};
    use cabinet_core::HealthStatus;
    use cabinet_db::MemoryTokenStore;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(owner: Uuid, visibility: Visibility) -> FileRecord {
        NewFileRecord::with_content(
            owner,
            "notes.txt".into(),
            FileKind::File,
            visibility,
            ParentRef::Root,
            Uuid::new_v4(),
        )
        .into_record(Uuid::new_v4(), Utc::now())
    }

    fn guard_with(tokens: Arc<dyn TokenStore>) -> AccessGuard {
        AccessGuard::new(tokens, Duration::from_secs(1))
    }

    struct DownTokenStore;

    #[async_trait]
    impl TokenStore for DownTokenStore {
        async fn put(&self, _user_id: Uuid, _ttl: Duration) -> Result<String, AppError> {
            Err(AppError::Unavailable("down".into()))
        }

        async fn resolve(&self, _token: &str) -> Result<Option<Uuid>, AppError> {
            Err(AppError::Unavailable("down".into()))
        }

        async fn revoke(&self, _token: &str) -> Result<(), AppError> {
            Err(AppError::Unavailable("down".into()))
        }

        async fn health(&self) -> HealthStatus {
            HealthStatus::Disconnected
        }
    }

    struct HangingTokenStore;

    #[async_trait]
    impl TokenStore for HangingTokenStore {
        async fn put(&self, _user_id: Uuid, _ttl: Duration) -> Result<String, AppError> {
            std::future::pending().await
        }

        async fn resolve(&self, _token: &str) -> Result<Option<Uuid>, AppError> {
            std::future::pending().await
        }

        async fn revoke(&self, _token: &str) -> Result<(), AppError> {
            std::future::pending().await
        }

        async fn health(&self) -> HealthStatus {
            HealthStatus::Connected
        }
    }

    #[test]
    fn test_extract_token_prefers_x_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer second"));
        assert_eq!(extract_token(&headers), Some("second"));

        headers.insert("x-token", HeaderValue::from_static("first"));
        assert_eq!(extract_token(&headers), Some("first"));

        let mut basic = HeaderMap::new();
        basic.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&basic), None);
    }

    #[tokio::test]
    async fn test_authenticate_resolves_issued_token() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let user_id = Uuid::new_v4();
        let token = tokens.put(user_id, Duration::from_secs(60)).await.unwrap();
        let guard = guard_with(tokens);

        let user = guard.authenticate(Some(&token)).await.unwrap();
        assert_eq!(user.user_id, user_id);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_missing_and_unknown() {
        let guard = guard_with(Arc::new(MemoryTokenStore::new()));
        assert!(matches!(
            guard.authenticate(None).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            guard.authenticate(Some("deadbeef")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_store_outage_is_unavailable_not_unauthorized() {
        let guard = guard_with(Arc::new(DownTokenStore));
        assert!(matches!(
            guard.authenticate(Some("abc")).await,
            Err(AppError::Unavailable(_))
        ));

        let guard = AccessGuard::new(Arc::new(HangingTokenStore), Duration::from_millis(20));
        assert!(matches!(
            guard.authenticate(Some("abc")).await,
            Err(AppError::Unavailable(_))
        ));
    }

    #[test]
    fn test_private_record_hidden_from_everyone_but_owner() {
        let guard = guard_with(Arc::new(MemoryTokenStore::new()));
        let owner = AuthUser {
            user_id: Uuid::new_v4(),
        };
        let stranger = AuthUser {
            user_id: Uuid::new_v4(),
        };
        let private = record(owner.user_id, Visibility::Private);

        assert!(guard.authorize(&private, Some(&owner), Action::Read).is_ok());
        assert!(guard.authorize(&private, Some(&owner), Action::Write).is_ok());
        assert!(matches!(
            guard.authorize(&private, Some(&stranger), Action::Read),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            guard.authorize(&private, None, Action::Read),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_public_record_readable_but_not_writable() {
        let guard = guard_with(Arc::new(MemoryTokenStore::new()));
        let stranger = AuthUser {
            user_id: Uuid::new_v4(),
        };
        let public = record(Uuid::new_v4(), Visibility::Public);

        assert!(guard.can_read(&public, None));
        assert!(guard.can_read(&public, Some(&stranger)));
        assert!(matches!(
            guard.authorize(&public, Some(&stranger), Action::Write),
            Err(AppError::NotFound(_))
        ));
        assert!(guard.authorize(&public, None, Action::Write).is_err());
    }
}
