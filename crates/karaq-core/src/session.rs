//! Durable session persistence.
//!
//! Only the durable subset of the player state survives a reload: the
//! queue, the cursor, and the volume. The playing flag is excluded so
//! playback never auto-starts on reload, and media handles are excluded
//! because they cannot outlive the session (see
//! [`crate::registry::MediaRegistry`]).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, FileSystemError, Result};
use crate::item::PlaylistItem;
use crate::queue::{DEFAULT_VOLUME, NO_SELECTION};

/// Fixed namespace key the session state is stored under.
pub const STORAGE_KEY: &str = "player-storage";

/// The durable subset of the player state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// The playback queue.
    pub playlist: Vec<PlaylistItem>,
    /// The cursor, or `-1` for no selection.
    pub current_index: i64,
    /// Playback volume in `0.0..=1.0`.
    pub volume: f64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            playlist: Vec::new(),
            current_index: NO_SELECTION,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// File-backed store for [`SessionState`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the platform default location.
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(default_session_path())
    }

    /// The file path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session, or defaults when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<SessionState> {
        if !self.path.exists() {
            debug!("No persisted session at {}, using defaults", self.path.display());
            return Ok(SessionState::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::FileSystem(FileSystemError::ReadFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })
        })?;

        let state: SessionState = serde_json::from_str(&content)?;
        info!(
            "Loaded session from {}: {} entries",
            self.path.display(),
            state.playlist.len()
        );
        Ok(state)
    }

    /// Persist the session, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::FileSystem(FileSystemError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    reason: e.to_string(),
                })
            })?;
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content).map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })
        })?;

        debug!("Saved session to {}", self.path.display());
        Ok(())
    }
}

/// Platform default path for the session file.
#[must_use]
pub fn default_session_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("karaq")
        .join(format!("{STORAGE_KEY}.json"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::item::{PlaylistItem, SourceType};
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("missing.json"));

        let state = store.load().unwrap();
        assert!(state.playlist.is_empty());
        assert_eq!(state.current_index, NO_SELECTION);
        assert_eq!(state.volume, DEFAULT_VOLUME);
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("nested").join("session.json"));

        let state = SessionState {
            playlist: vec![
                PlaylistItem::new(SourceType::Youtube)
                    .with_title("Bohemian Rhapsody")
                    .with_artist("Queen")
                    .with_youtube("https://youtu.be/fJ9rUzIMcZQ", Some("fJ9rUzIMcZQ")),
                PlaylistItem::new(SourceType::Local).with_file_name("duet.mp4"),
            ],
            current_index: 1,
            volume: 0.8,
        };

        store.save(&state).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_persisted_shape_has_fixed_fields() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("session.json"));
        store.save(&SessionState::default()).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("playlist").is_some());
        assert!(value.get("currentIndex").is_some());
        assert!(value.get("volume").is_some());
        // Transient state never lands on disk.
        assert!(value.get("isPlaying").is_none());
        assert!(value.get("fileMap").is_none());
    }

    #[test]
    fn test_load_corrupt_file_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = SessionStore::new(&path);
        assert!(store.load().is_err());
    }

    #[test]
    fn test_default_path_uses_storage_key() {
        let path = default_session_path();
        assert!(path.to_string_lossy().contains(STORAGE_KEY));
        assert!(path.to_string_lossy().ends_with(".json"));
    }
}
