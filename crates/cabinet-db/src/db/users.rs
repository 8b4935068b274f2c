use async_trait::async_trait;
use cabinet_core::models::User;
use cabinet_core::{AppError, HealthStatus};
use chrono::Utc;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::map_constraint_violation;

/// Message returned when an email is already registered.
pub const DUPLICATE_EMAIL: &str = "Already exist";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. A registered email is rejected with `Conflict`.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn health(&self) -> HealthStatus;
}

#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[tracing::instrument(skip(self, email, password_hash), fields(db.table = "users", db.operation = "insert"))]
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        // The unique index on email is the source of truth; concurrent signups for
        // the same address resolve to exactly one row.
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_violation(e, DUPLICATE_EMAIL))?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, email), fields(db.table = "users", db.operation = "select"))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "count"))]
    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn health(&self) -> HealthStatus {
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        HealthStatus::from(&result)
    }
}
