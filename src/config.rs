//! Global weeksync configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_settle_secs() -> u64 {
    2
}

/// Configuration at ~/.config/weeksync/config.toml
///
/// Google credentials and tokens live separately under the google/
/// subdirectory; this file only carries scheduling preferences and the
/// active account.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// IANA zone the schedule's wall-clock times are interpreted in.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Target calendar id ("primary" is Google's alias for the user's
    /// main calendar).
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Account `weeksync auth` authenticated as.
    pub account: Option<String>,

    /// Seconds to wait between wiping and recreating events, so the remote
    /// observes the deletions before anything lands on top of them.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,

    /// Schedule file; defaults to schedule.toml next to this config.
    pub schedule_path: Option<PathBuf>,

    /// Identity store file; defaults to event_ids.json in the user data dir.
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            time_zone: default_time_zone(),
            calendar_id: default_calendar_id(),
            account: None,
            settle_secs: default_settle_secs(),
            schedule_path: None,
            store_path: None,
        }
    }
}

impl Config {
    fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join("weeksync"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config, falling back to defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        std::fs::create_dir_all(&dir)?;

        let path = dir.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    pub fn require_account(&self) -> Result<&str> {
        self.account
            .as_deref()
            .context("No account configured. Run `weeksync auth` first.")
    }

    pub fn tz(&self) -> Result<Tz> {
        self.time_zone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid time_zone '{}': {}", self.time_zone, e))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn schedule_path(&self) -> Result<PathBuf> {
        match &self.schedule_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("schedule.toml")),
        }
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(dirs::data_dir()
                .context("Could not determine data directory")?
                .join("weeksync")
                .join("event_ids.json")),
        }
    }
}
