use async_trait::async_trait;
use cabinet_core::models::{FileRecord, NewFileRecord, ParentRef, Visibility};
use cabinet_core::{AppError, HealthStatus};
use chrono::Utc;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::map_constraint_violation;

/// Fixed page size of `find_children`.
pub const PAGE_SIZE: u32 = 20;

const FILE_COLUMNS: &str = "id, user_id, name, kind, is_public, parent_id, blob_id, created_at";

/// Persistent collection of file and folder records.
///
/// Once `insert` returns, `get` and `find_children` observe the record.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Assign an identity and persist the record. Store constraint violations are
    /// reported as `Conflict`.
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Set the visibility of one record, leaving every other field untouched.
    /// Returns the updated record, or `None` when the record does not exist.
    async fn update_visibility(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<FileRecord>, AppError>;

    /// Children of `parent` in insertion order, `PAGE_SIZE` per zero-based page.
    async fn find_children(&self, parent: ParentRef, page: u32)
        -> Result<Vec<FileRecord>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn health(&self) -> HealthStatus;
}

/// Offset of a zero-based page.
pub(crate) fn page_offset(page: u32) -> i64 {
    i64::from(page) * i64::from(PAGE_SIZE)
}

/// PostgreSQL metadata store. Insertion order is the `seq` column.
#[derive(Clone)]
pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "insert", file.kind = %record.kind))]
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        record.check_shape()?;

        let query = format!(
            r#"
            INSERT INTO files (id, user_id, name, kind, is_public, parent_id, blob_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            FILE_COLUMNS
        );

        let inserted = sqlx::query_as::<Postgres, FileRecord>(&query)
            .bind(Uuid::new_v4())
            .bind(record.user_id)
            .bind(&record.name)
            .bind(record.kind)
            .bind(record.visibility.is_public())
            .bind(record.parent.folder_id())
            .bind(record.blob_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_violation(e, "Record violates a store constraint"))?;

        Ok(inserted)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let query = format!("SELECT {} FROM files WHERE id = $1", FILE_COLUMNS);
        let record = sqlx::query_as::<Postgres, FileRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    async fn update_visibility(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<FileRecord>, AppError> {
        let query = format!(
            "UPDATE files SET is_public = $2 WHERE id = $1 RETURNING {}",
            FILE_COLUMNS
        );
        let record = sqlx::query_as::<Postgres, FileRecord>(&query)
            .bind(id)
            .bind(visibility.is_public())
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn find_children(
        &self,
        parent: ParentRef,
        page: u32,
    ) -> Result<Vec<FileRecord>, AppError> {
        let records = match parent {
            ParentRef::Root => {
                let query = format!(
                    "SELECT {} FROM files WHERE parent_id IS NULL ORDER BY seq ASC LIMIT $1 OFFSET $2",
                    FILE_COLUMNS
                );
                sqlx::query_as::<Postgres, FileRecord>(&query)
                    .bind(i64::from(PAGE_SIZE))
                    .bind(page_offset(page))
                    .fetch_all(&self.pool)
                    .await?
            }
            ParentRef::Folder(parent_id) => {
                let query = format!(
                    "SELECT {} FROM files WHERE parent_id = $1 ORDER BY seq ASC LIMIT $2 OFFSET $3",
                    FILE_COLUMNS
                );
                sqlx::query_as::<Postgres, FileRecord>(&query)
                    .bind(parent_id)
                    .bind(i64::from(PAGE_SIZE))
                    .bind(page_offset(page))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "count"))]
    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn health(&self) -> HealthStatus {
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Metadata store health check failed");
        }
        HealthStatus::from(&result)
    }
}
