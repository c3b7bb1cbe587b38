//! Credential and token storage for the Google gateway.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("weeksync")
        .join("google"))
}

pub fn load_credentials() -> Result<GoogleCredentials> {
    let path = base_dir()?.join("credentials.json");

    if !path.exists() {
        anyhow::bail!(
            "Google credentials not found.\n\n\
            Create {} with:\n\n\
            {{\n  \
              \"client_id\": \"your-client-id.apps.googleusercontent.com\",\n  \
              \"client_secret\": \"your-client-secret\"\n\
            }}\n\n\
            See https://console.cloud.google.com/apis/credentials for setup.",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse credentials from {}", path.display()))
}

pub fn load_tokens(account: &str) -> Result<AccountTokens> {
    let path = token_path(account)?;

    if !path.exists() {
        anyhow::bail!(
            "No tokens for account: {}\n\
            Run `weeksync auth` first.",
            account
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read tokens from {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse tokens from {}", path.display()))
}

pub fn save_tokens(account: &str, tokens: &AccountTokens) -> Result<()> {
    let path = token_path(account)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create tokens directory at {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(tokens).context("Failed to serialize tokens")?;

    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write tokens to {}", path.display()))?;

    Ok(())
}

/// Whether the access token is expired or about to expire.
pub fn tokens_need_refresh(tokens: &AccountTokens) -> bool {
    match tokens.expires_at {
        Some(expires_at) => expires_at <= Utc::now() + chrono::Duration::seconds(60),
        None => false,
    }
}

fn token_path(account: &str) -> Result<PathBuf> {
    let safe_account = account.replace(['/', '\\', ':'], "_");
    Ok(base_dir()?
        .join("tokens")
        .join(format!("{}.json", safe_account)))
}
