//! Playback resolution.
//!
//! Turns the currently selected queue entry into something a player
//! surface can actually open: a YouTube identifier, or a temporary local
//! address minted from the registry handle backing a LOCAL entry.
//!
//! Temporary addresses are a scoped resource. The resolver holds at most
//! one live minted address; resolving a different entry (or releasing)
//! drops the previous guard, which deletes the backing file
//! deterministically rather than waiting on garbage timing.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;
use crate::item::{PlaylistItem, SourceType};
use crate::registry::{MediaHandle, MediaRegistry};

/// A playable address for the current entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    /// Stream by YouTube identifier; no file lookup involved.
    YouTube {
        /// Normalized 11-character video identifier.
        video_id: String,
    },
    /// A minted temporary file holding the entry's media bytes.
    LocalFile {
        /// Path of the temporary file. Valid until the next resolution
        /// or release.
        path: PathBuf,
    },
    /// An externally managed address passed through unchanged.
    LocalUrl {
        /// The address.
        url: String,
    },
}

/// Outcome of resolving a queue entry.
///
/// `Unresolved` is data, not an error: a LOCAL entry whose backing handle
/// is gone (common after a reload) should surface a re-linking affordance,
/// not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The entry can be played right now.
    Playable(PlaybackSource),
    /// The entry's backing media is not available in this session.
    Unresolved {
        /// The file name to re-link, when the entry has one.
        file_name: Option<String>,
    },
}

/// The single live minted address and the entry it belongs to.
struct ActiveMedia {
    item_id: String,
    file: NamedTempFile,
}

/// Resolves queue entries to playable addresses, owning the single slot
/// for minted temporary files.
#[derive(Default)]
pub struct PlaybackResolver {
    active: Option<ActiveMedia>,
}

impl PlaybackResolver {
    /// Create a resolver with no live address.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `item` to a playable address.
    ///
    /// Any previously minted temporary address is invalidated first, so
    /// exactly one is live at a time.
    ///
    /// # Errors
    ///
    /// Returns an error only when minting the temporary file fails;
    /// missing handles are reported as [`Resolution::Unresolved`].
    pub fn resolve(
        &mut self,
        item: &PlaylistItem,
        registry: &MediaRegistry,
    ) -> Result<Resolution> {
        // Entry change invalidates the previous address before the new one
        // is minted.
        self.release();

        match item.source {
            SourceType::Youtube => match item.youtube_id.as_deref() {
                Some(video_id) if !video_id.is_empty() => {
                    Ok(Resolution::Playable(PlaybackSource::YouTube {
                        video_id: video_id.to_string(),
                    }))
                }
                _ => {
                    warn!("Entry {} has no video identifier", item.id);
                    Ok(Resolution::Unresolved { file_name: None })
                }
            },
            SourceType::Local => {
                let Some(file_name) = item.file_name.as_deref().filter(|n| !n.is_empty()) else {
                    warn!("Entry {} has no backing file name", item.id);
                    return Ok(Resolution::Unresolved { file_name: None });
                };

                match registry.resolve(file_name) {
                    Some(MediaHandle::Blob(bytes)) => {
                        let path = self.mint(item, file_name, bytes)?;
                        Ok(Resolution::Playable(PlaybackSource::LocalFile { path }))
                    }
                    Some(MediaHandle::Uri(url)) => {
                        Ok(Resolution::Playable(PlaybackSource::LocalUrl {
                            url: url.clone(),
                        }))
                    }
                    None => {
                        debug!(
                            "No handle registered for {} (entry {})",
                            file_name, item.id
                        );
                        Ok(Resolution::Unresolved {
                            file_name: Some(file_name.to_string()),
                        })
                    }
                }
            }
        }
    }

    /// Write the handle's bytes into a fresh temporary file and take the
    /// single slot.
    fn mint(&mut self, item: &PlaylistItem, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("karaq-");
        // Keep the original extension so players can sniff the container.
        let suffix = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"));
        if let Some(ref suffix) = suffix {
            builder.suffix(suffix);
        }

        let mut file = builder.tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        debug!(
            "Minted temporary address {} for entry {}",
            path.display(),
            item.id
        );
        self.active = Some(ActiveMedia {
            item_id: item.id.clone(),
            file,
        });
        Ok(path)
    }

    /// Invalidate the live temporary address, if any. Called on entry
    /// change and teardown; idempotent.
    pub fn release(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(
                "Releasing temporary address for entry {}",
                active.item_id
            );
            // Dropping the guard deletes the file.
            drop(active);
        }
    }

    /// Path of the live minted address, if any.
    #[must_use]
    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.file.path())
    }

    /// Id of the entry the live minted address belongs to, if any.
    #[must_use]
    pub fn active_item_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.item_id.as_str())
    }
}

impl std::fmt::Debug for PlaybackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackResolver")
            .field("active", &self.active.as_ref().map(|a| &a.item_id))
            .finish()
    }
}
