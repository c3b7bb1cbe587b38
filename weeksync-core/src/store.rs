//! Persisted identity mapping from template title to remote event id.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{WeekSyncError, WeekSyncResult};

/// Mapping from template title to the remote event id the engine last
/// created or touched for that title.
///
/// The store is the sole source of idempotency across runs: a present entry
/// means "update this event", an absent one means "create from scratch".
/// It is loaded once per run, consulted read-only, and replaced wholesale
/// by the next snapshot on save. It is not a cache of all remote events,
/// only of events this engine created or last touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityStore {
    #[serde(default)]
    event_ids: BTreeMap<String, String>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, title: &str) -> Option<&str> {
        self.event_ids.get(title).map(String::as_str)
    }

    pub fn insert(&mut self, title: impl Into<String>, event_id: impl Into<String>) {
        self.event_ids.insert(title.into(), event_id.into());
    }

    /// (title, event id) pairs in title order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.event_ids
            .iter()
            .map(|(title, id)| (title.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.event_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_ids.is_empty()
    }

    /// Load the store from `path`. A missing file is an empty store, not an
    /// error; a malformed file is.
    pub fn load(path: &Path) -> WeekSyncResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            WeekSyncError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Replace the persisted snapshot with this one.
    ///
    /// Writes to a temp file and renames over the target, so a failed write
    /// leaves the previous snapshot intact.
    pub fn save(&self, path: &Path) -> WeekSyncResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| WeekSyncError::Serialization(e.to_string()))?;

        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, path)?;
        Ok(())
    }
}
