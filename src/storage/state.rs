use crate::deck::SavedState;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Storage key; also the file stem of the state file.
pub const STORAGE_KEY: &str = "flashcards_app_state";

/// Payload version written by this build. Anything else is ignored on load.
pub const VERSION: u64 = 1;

#[derive(Serialize)]
struct PayloadOut<'a> {
    version: u64,
    state: &'a SavedState,
    #[serde(rename = "savedAt")]
    saved_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct PayloadIn {
    version: serde_json::Value,
    #[serde(default)]
    state: Option<SavedState>,
    #[serde(rename = "savedAt", default)]
    saved_at: Option<DateTime<Utc>>,
}

/// File-backed store for the deck state.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store in the XDG data directory.
    pub fn new() -> Result<Self> {
        let dir = get_storage_dir()?;
        Ok(Self::with_path(dir.join(format!("{STORAGE_KEY}.json"))))
    }

    /// Store at an explicit path (config override, tests).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state. Missing, unreadable, unparsable, or
    /// wrong-version files all yield `None`.
    pub fn load_state(&self) -> Option<SavedState> {
        self.load_payload().and_then(|p| p.state)
    }

    /// When the state was last written, if known.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.load_payload().and_then(|p| p.saved_at)
    }

    fn load_payload(&self) -> Option<PayloadIn> {
        if !self.path.exists() {
            return None;
        }
        let payload = match read_payload(&self.path) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "ignoring unreadable saved state");
                return None;
            }
        };
        if payload.version.as_u64() != Some(VERSION) {
            debug!(version = %payload.version, "ignoring saved state with unknown version");
            return None;
        }
        Some(payload)
    }

    /// Write the state. Returns `false` (and logs) if it could not be saved.
    pub fn save_state(&self, state: &SavedState) -> bool {
        match self.try_save(state) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "failed to save state");
                false
            }
        }
    }

    fn try_save(&self, state: &SavedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }
        let payload = PayloadOut {
            version: VERSION,
            state,
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&payload).context("Failed to serialize state")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;
        Ok(())
    }
}

/// Get the XDG-compliant storage directory for state data
fn get_storage_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", "flashdeck")
        .context("Failed to determine application data directory")?;

    Ok(proj_dirs.data_dir().to_path_buf())
}

fn read_payload(path: &Path) -> Result<PayloadIn> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;

    let payload: PayloadIn = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

    Ok(payload)
}
