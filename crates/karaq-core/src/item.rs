//! Queue entry data model.
//!
//! A [`PlaylistItem`] is one entry in the playback queue. Entries come from
//! two places: the bulk spreadsheet import and ad-hoc additions (dropped
//! video files, pasted YouTube links). The serialized shape is stable and
//! shared with the persisted session state, so field names follow the wire
//! format (`camelCase`, with the source tag serialized as `"type"`).

use serde::{Deserialize, Serialize};

/// Placeholder title used when an entry has no song name.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Placeholder artist used when an entry has no artist.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Where an entry's media comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    /// A locally supplied video file, looked up by name in the media
    /// registry at playback time.
    #[default]
    Local,
    /// A YouTube video, played by its extracted identifier.
    Youtube,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "LOCAL"),
            Self::Youtube => write!(f, "YOUTUBE"),
        }
    }
}

/// Lifecycle status of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    /// Entry is valid and waiting to be played.
    #[default]
    Ready,
    /// Entry's backing media could not be found.
    Missing,
    /// Entry failed validation (no link, no file name).
    Error,
    /// Entry is currently playing.
    Playing,
    /// Entry finished playing.
    Done,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "READY"),
            Self::Missing => write!(f, "MISSING"),
            Self::Error => write!(f, "ERROR"),
            Self::Playing => write!(f, "PLAYING"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

/// One entry in the playback queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    /// Opaque unique identifier, stable for the entry's lifetime.
    pub id: String,
    /// Initial sort key from import. Once imported, queue position is
    /// authoritative; values need not be contiguous or unique.
    pub order: i64,
    /// Media source variant.
    #[serde(rename = "type")]
    pub source: SourceType,
    /// Display title.
    pub title: String,
    /// Display artist.
    pub artist: String,
    /// Free-text notes carried through from import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// File name for LOCAL entries; the media registry lookup key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Raw YouTube link as the user or spreadsheet supplied it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    /// Normalized 11-character YouTube identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_id: Option<String>,
    /// Duration in seconds. Reserved; not consulted by any logic yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Current lifecycle status.
    pub status: ItemStatus,
}

impl PlaylistItem {
    /// Create a new entry with a fresh id and placeholder display fields.
    #[must_use]
    pub fn new(source: SourceType) -> Self {
        Self {
            id: new_item_id(),
            order: 0,
            source,
            title: UNKNOWN_TITLE.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            notes: None,
            file_name: None,
            youtube_url: None,
            youtube_id: None,
            duration: None,
            status: ItemStatus::Ready,
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the artist.
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Set the initial sort key.
    #[must_use]
    pub const fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    /// Set the notes field.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the backing file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the raw YouTube link and its extracted identifier.
    #[must_use]
    pub fn with_youtube(
        mut self,
        url: impl Into<String>,
        video_id: Option<impl Into<String>>,
    ) -> Self {
        self.youtube_url = Some(url.into());
        self.youtube_id = video_id.map(Into::into);
        self
    }

    /// Set the status.
    #[must_use]
    pub const fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Apply the source-specific validation invariants, downgrading the
    /// status to [`ItemStatus::Error`] when they fail.
    ///
    /// A YOUTUBE entry with no resolvable identifier and a LOCAL entry with
    /// no file name cannot be played and must surface as errors rather than
    /// be dropped.
    pub fn apply_validation(&mut self) {
        match self.source {
            SourceType::Youtube => {
                if self.youtube_id.as_deref().is_none_or(str::is_empty) {
                    self.status = ItemStatus::Error;
                }
            }
            SourceType::Local => {
                if self.file_name.as_deref().is_none_or(str::is_empty) {
                    self.status = ItemStatus::Error;
                }
            }
        }
    }

    /// Whether the entry passed validation and is currently playable in
    /// principle (its backing media may still be unresolved).
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.status, ItemStatus::Ready | ItemStatus::Playing)
    }
}

/// Generate a fresh unique entry identifier.
///
/// With the default `strong-ids` feature this is a v4 UUID. Without it the
/// weaker [`fallback_item_id`] source is used.
#[must_use]
pub fn new_item_id() -> String {
    #[cfg(feature = "strong-ids")]
    {
        uuid::Uuid::new_v4().to_string()
    }
    #[cfg(not(feature = "strong-ids"))]
    {
        fallback_item_id()
    }
}

/// Timestamp+random identifier fallback.
///
/// Collision resistance is bounded by one millisecond of clock resolution
/// plus 32 bits of randomness — fine for a single session's queue, not for
/// anything shared. Prefer [`new_item_id`].
#[must_use]
pub fn fallback_item_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64);
    format!("item-{millis}-{:08x}", rand::random::<u32>())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_new_item_defaults() {
        let item = PlaylistItem::new(SourceType::Local);
        assert_eq!(item.title, UNKNOWN_TITLE);
        assert_eq!(item.artist, UNKNOWN_ARTIST);
        assert_eq!(item.status, ItemStatus::Ready);
        assert!(!item.id.is_empty());
    }

    #[test]
    fn test_item_ids_are_unique() {
        let a = new_item_id();
        let b = new_item_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fallback_id_shape() {
        let id = fallback_item_id();
        assert!(id.starts_with("item-"));
        assert_eq!(id.split('-').count(), 3);
    }

    #[test]
    fn test_youtube_without_id_is_error() {
        let mut item = PlaylistItem::new(SourceType::Youtube)
            .with_youtube("https://example.com", None::<String>);
        item.apply_validation();
        assert_eq!(item.status, ItemStatus::Error);
    }

    #[test]
    fn test_youtube_with_id_stays_ready() {
        let mut item = PlaylistItem::new(SourceType::Youtube)
            .with_youtube("https://youtu.be/dQw4w9WgXcQ", Some("dQw4w9WgXcQ"));
        item.apply_validation();
        assert_eq!(item.status, ItemStatus::Ready);
    }

    #[test]
    fn test_local_without_file_name_is_error() {
        let mut item = PlaylistItem::new(SourceType::Local);
        item.apply_validation();
        assert_eq!(item.status, ItemStatus::Error);
    }

    #[test]
    fn test_serialized_wire_shape() {
        let item = PlaylistItem::new(SourceType::Youtube)
            .with_title("Never Gonna Give You Up")
            .with_artist("Rick Astley")
            .with_youtube("https://youtu.be/dQw4w9WgXcQ", Some("dQw4w9WgXcQ"));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "YOUTUBE");
        assert_eq!(json["status"], "READY");
        assert_eq!(json["youtubeId"], "dQw4w9WgXcQ");
        // Absent optionals are omitted entirely
        assert!(json.get("fileName").is_none());
        assert!(json.get("duration").is_none());
    }

    #[test]
    fn test_deserialize_without_optionals() {
        let json = r#"{
            "id": "x",
            "order": 1,
            "type": "LOCAL",
            "title": "Song",
            "artist": "Band",
            "status": "READY"
        }"#;
        let item: PlaylistItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.source, SourceType::Local);
        assert!(item.file_name.is_none());
        assert!(item.notes.is_none());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ItemStatus::Error.to_string(), "ERROR");
        assert_eq!(SourceType::Youtube.to_string(), "YOUTUBE");
    }
}
