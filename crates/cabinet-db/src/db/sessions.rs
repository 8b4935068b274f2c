use async_trait::async_trait;
use cabinet_core::{AppError, HealthStatus};
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use uuid::Uuid;

/// Ephemeral mapping from opaque session token to user identity.
///
/// An unreachable store is reported as `AppError::Unavailable`, never as a missing
/// token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Generate a random token bound to `user_id`, expiring after `ttl`.
    async fn put(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError>;

    /// `None` when the token is unknown or expired.
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError>;

    /// Invalidate a token. Unknown tokens are ignored.
    async fn revoke(&self, token: &str) -> Result<(), AppError>;

    async fn health(&self) -> HealthStatus;
}

/// Generate a session token: 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: [u8; 32] = rng.random();
    hex::encode(random_bytes)
}

/// SHA-256 digest of a token, hex encoded. Only digests are persisted.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn unavailable(err: sqlx::Error) -> AppError {
    tracing::error!(error = %err, "Token store unavailable");
    AppError::Unavailable(format!("Token store error: {}", err))
}

/// PostgreSQL token store over the `sessions` table.
#[derive(Clone)]
pub struct PostgresTokenStore {
    pool: PgPool,
}

impl PostgresTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PostgresTokenStore {
    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "insert", user.id = %user_id))]
    async fn put(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let token = generate_token();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AppError::InvalidInput(format!("Invalid session TTL: {}", e)))?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO sessions (token_digest, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token_digest(&token))
        .bind(user_id)
        .bind(now + ttl)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(token)
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "sessions", db.operation = "select"))]
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        let user_id = sqlx::query_scalar::<Postgres, Uuid>(
            "SELECT user_id FROM sessions WHERE token_digest = $1 AND expires_at > now()",
        )
        .bind(token_digest(token))
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(user_id)
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "sessions", db.operation = "delete"))]
    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token_digest = $1")
            .bind(token_digest(token))
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn health(&self) -> HealthStatus {
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        HealthStatus::from(&result)
    }
}
