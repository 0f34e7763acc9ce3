//! Session-scoped media handle registry.
//!
//! Local file handles cannot be serialized and do not survive a reload, so
//! they live in this best-effort side table keyed by the stable file name,
//! decoupled from the durable queue. After a reload the queue comes back
//! from persistence with an empty registry; re-selecting the files
//! re-links them without re-importing the playlist.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

/// A volatile handle to media content. Deliberately not serializable.
#[derive(Debug, Clone)]
pub enum MediaHandle {
    /// In-memory file content, as produced by a drag-and-drop or file
    /// picker read.
    Blob(Arc<Vec<u8>>),
    /// An externally managed address (e.g. a platform-provided content
    /// URI) that can be handed to a player as-is.
    Uri(String),
}

impl MediaHandle {
    /// Wrap raw file bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Blob(Arc::new(bytes))
    }

    /// Whether this handle carries live binary content.
    #[must_use]
    pub const fn is_blob(&self) -> bool {
        matches!(self, Self::Blob(_))
    }
}

/// Process-lifetime mapping from file name to media handle.
///
/// Entries are added when the user selects or drops files and are never
/// automatically removed; registering an existing name overwrites it with
/// the fresher handle.
#[derive(Debug, Default)]
pub struct MediaRegistry {
    entries: HashMap<String, MediaHandle>,
}

impl MediaRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under `name`, overwriting any existing entry.
    pub fn register(&mut self, name: impl Into<String>, handle: MediaHandle) {
        let name = name.into();
        debug!("Registering media handle: {}", name);
        self.entries.insert(name, handle);
    }

    /// Look up the handle for `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&MediaHandle> {
        self.entries.get(name)
    }

    /// Whether a handle is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no handles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
