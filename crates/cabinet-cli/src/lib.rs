//! Operator commands against the configured stores.
//!
//! Session tokens are never issued over HTTP; operators mint and revoke them here.

use anyhow::{bail, Context, Result};
use cabinet_db::{verify_password, MetadataStore, Stores, TokenStore, UserStore};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Stats {
    pub users: i64,
    pub files: i64,
}

/// Issue a session token for the account behind `email`.
///
/// When `password` is given it must match the stored hash.
pub async fn issue_token(
    stores: &Stores,
    email: &str,
    password: Option<&str>,
    ttl: Duration,
) -> Result<IssuedToken> {
    let user = stores
        .users
        .find_by_email(email)
        .await
        .context("Failed to look up user")?;
    let Some(user) = user else {
        bail!("No user registered with email {}", email);
    };

    if let Some(password) = password {
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("Password verification task failed")??;
        if !matches {
            bail!("Invalid password for {}", email);
        }
    }

    let token = stores
        .tokens
        .put(user.id, ttl)
        .await
        .context("Failed to store session token")?;
    tracing::info!(user.id = %user.id, ttl_secs = ttl.as_secs(), "Session token issued");

    Ok(IssuedToken {
        user_id: user.id,
        email: user.email,
        token,
        expires_in_secs: ttl.as_secs(),
    })
}

/// Revoke a token. Unknown tokens are not an error.
pub async fn revoke_token(stores: &Stores, token: &str) -> Result<()> {
    stores
        .tokens
        .revoke(token)
        .await
        .context("Failed to revoke session token")?;
    tracing::info!("Session token revoked");
    Ok(())
}

pub async fn stats(stores: &Stores) -> Result<Stats> {
    let (users, files) = tokio::try_join!(stores.users.count(), stores.metadata.count())?;
    Ok(Stats { users, files })
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
