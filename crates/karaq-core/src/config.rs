//! Application configuration management.
//!
//! Handles loading, saving, and managing application-wide settings,
//! including where the persisted session lives and how metadata
//! enrichment is reached.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, FileSystemError, Result};
use crate::queue::DEFAULT_VOLUME;
use crate::session::{STORAGE_KEY, SessionStore};
use crate::youtube::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_METADATA_ENDPOINT};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Directory where the persisted session state is stored.
    pub storage_directory: PathBuf,
    /// oEmbed-compatible endpoint used for metadata enrichment.
    #[serde(default = "default_metadata_endpoint")]
    pub metadata_endpoint: String,
    /// Timeout for a metadata lookup, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Volume applied when no session has been persisted yet.
    #[serde(default = "default_volume")]
    pub default_volume: f64,
}

fn default_metadata_endpoint() -> String {
    DEFAULT_METADATA_ENDPOINT.to_string()
}

const fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

const fn default_volume() -> f64 {
    DEFAULT_VOLUME
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_directory: default_storage_directory(),
            metadata_endpoint: default_metadata_endpoint(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            default_volume: default_volume(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, or create default if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        if !config_path.exists() {
            debug!("Config file not found, using defaults");
            let config = Self::default();
            if let Err(e) = config.save() {
                warn!("Failed to save default config: {}", e);
            }
            return Ok(config);
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            Error::FileSystem(FileSystemError::ReadFailed {
                path: config_path.clone(),
                reason: format!("Failed to read config file: {e}"),
            })
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;

        info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save(&self) -> Result<()> {
        let config_path = config_file_path();

        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::FileSystem(FileSystemError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    reason: format!("Failed to create config directory: {e}"),
                })
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, content).map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: config_path.clone(),
                reason: format!("Failed to write config file: {e}"),
            })
        })?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Update the storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory doesn't exist and can't be
    /// created, or isn't writable.
    pub fn set_storage_directory(&mut self, path: PathBuf) -> Result<()> {
        validate_storage_directory(&path)?;
        self.storage_directory = path;
        info!(
            "Updated storage directory to: {}",
            self.storage_directory.display()
        );
        Ok(())
    }

    /// Session store rooted at the configured storage directory.
    #[must_use]
    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(self.storage_directory.join(format!("{STORAGE_KEY}.json")))
    }

    /// Get the path to the config file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        config_file_path()
    }
}

/// Get the default storage directory for session state.
#[must_use]
pub fn default_storage_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("karaq")
}

/// Get the path to the config file.
fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("karaq")
        .join("config.json")
}

/// Validate that a directory is suitable for storing session state.
fn validate_storage_directory(path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(Error::Configuration(
            "Storage directory must be an absolute path".to_string(),
        ));
    }

    if path.exists() {
        if !path.is_dir() {
            return Err(Error::Configuration(format!(
                "Path exists but is not a directory: {}",
                path.display()
            )));
        }

        let test_file = path.join(".karaq_write_test");
        match fs::write(&test_file, "test") {
            Ok(()) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                return Err(Error::Configuration(format!(
                    "Directory is not writable: {} ({})",
                    path.display(),
                    e
                )));
            }
        }
    } else {
        fs::create_dir_all(path).map_err(|e| {
            Error::Configuration(format!("Cannot create directory {}: {}", path.display(), e))
        })?;
    }

    Ok(())
}
