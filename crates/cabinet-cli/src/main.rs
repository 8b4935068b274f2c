//! Cabinet operator CLI: issue and revoke session tokens, print store counts.
//!
//! Reads the same environment as the server (METADATA_BACKEND, DATABASE_URL, ...).

use anyhow::Context;
use cabinet_cli::{init_tracing, issue_token, revoke_token, stats};
use cabinet_core::{Config, MetadataBackend};
use cabinet_db::create_stores;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "cabinet", about = "Cabinet operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a session token for a registered user
    IssueToken {
        /// Email the user signed up with
        #[arg(long)]
        email: String,
        /// Verify this password before issuing
        #[arg(long)]
        password: Option<String>,
        /// Token lifetime in seconds (default: SESSION_TTL_SECS)
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Revoke a session token
    RevokeToken {
        /// Token to revoke
        token: String,
    },
    /// Print user and file counts
    Stats,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    if config.metadata_backend() == MetadataBackend::Memory {
        tracing::warn!("METADATA_BACKEND=memory: tokens issued here are not visible to the server");
    }

    let stores = create_stores(&config).await?;

    match cli.command {
        Commands::IssueToken {
            email,
            password,
            ttl,
        } => {
            let ttl = ttl.map(Duration::from_secs).unwrap_or(config.session_ttl());
            let issued = issue_token(&stores, &email, password.as_deref(), ttl).await?;
            print_json(&issued)?;
        }
        Commands::RevokeToken { token } => {
            revoke_token(&stores, &token).await?;
            print_json(&serde_json::json!({ "revoked": true }))?;
        }
        Commands::Stats => {
            print_json(&stats(&stores).await?)?;
        }
    }

    Ok(())
}
