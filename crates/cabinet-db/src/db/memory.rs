//! In-process stores. State lives for the lifetime of the process.

use async_trait::async_trait;
use cabinet_core::models::{FileRecord, NewFileRecord, ParentRef, User, Visibility};
use cabinet_core::{AppError, HealthStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::files::{MetadataStore, PAGE_SIZE};
use super::sessions::{generate_token, token_digest, TokenStore};
use super::users::{UserStore, DUPLICATE_EMAIL};

#[derive(Default)]
struct FileTable {
    /// Record ids in insertion order
    order: Vec<Uuid>,
    by_id: HashMap<Uuid, FileRecord>,
}

#[derive(Clone, Default)]
pub struct MemoryMetadataStore {
    files: Arc<RwLock<FileTable>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        record.check_shape()?;

        let mut files = self.files.write().await;
        if let Some(parent_id) = record.parent.folder_id() {
            if !files.by_id.contains_key(&parent_id) {
                return Err(AppError::Conflict(
                    "Record violates a store constraint".to_string(),
                ));
            }
        }

        let inserted = record.into_record(Uuid::new_v4(), Utc::now());
        files.order.push(inserted.id);
        files.by_id.insert(inserted.id, inserted.clone());
        Ok(inserted)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self.files.read().await.by_id.get(&id).cloned())
    }

    async fn update_visibility(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<FileRecord>, AppError> {
        let mut files = self.files.write().await;
        Ok(files.by_id.get_mut(&id).map(|record| {
            record.is_public = visibility.is_public();
            record.clone()
        }))
    }

    async fn find_children(
        &self,
        parent: ParentRef,
        page: u32,
    ) -> Result<Vec<FileRecord>, AppError> {
        let files = self.files.read().await;
        let skip = page as usize * PAGE_SIZE as usize;
        Ok(files
            .order
            .iter()
            .filter_map(|id| files.by_id.get(id))
            .filter(|record| record.parent() == parent)
            .skip(skip)
            .take(PAGE_SIZE as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.files.read().await.order.len() as i64)
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus::Connected
    }
}

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<Vec<User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus::Connected
    }
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: Uuid,
    expires_at: Instant,
}

/// Token store keyed by token digest, with lazy expiry on lookup.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries still held, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let token = generate_token();
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| AppError::InvalidInput("Invalid session TTL".to_string()))?;

        self.sessions.lock().await.insert(
            token_digest(&token),
            Session {
                user_id,
                expires_at,
            },
        );
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        let digest = token_digest(token);
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&digest).copied() {
            Some(session) if session.expires_at > Instant::now() => Ok(Some(session.user_id)),
            Some(_) => {
                sessions.remove(&digest);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        self.sessions.lock().await.remove(&token_digest(token));
        Ok(())
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus::Connected
    }
}
