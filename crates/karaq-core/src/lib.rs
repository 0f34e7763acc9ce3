//! Karaq Core Library
//!
//! This crate provides the core functionality for the Karaq karaoke queue
//! player:
//! - Bulk playlist import from spreadsheet files and dropped-file intake
//! - YouTube link parsing and best-effort metadata enrichment
//! - The playback queue state machine (cursor, playing flag, volume)
//! - Session persistence for the durable subset of the player state
//! - A session-scoped media handle registry and playback resolution
//! - Application configuration management
//!
//! Presentation components (drop zones, queue lists, player surfaces) sit
//! on top of this crate: they read cloned snapshots and request changes
//! through [`queue::QueueManager`]'s operation set.
//!
//! # Error Handling
//!
//! This crate uses typed errors per domain; see the [`error`] module.
//! Failures that concern a single queue entry are represented as data on
//! the entry (its `status` field) rather than as errors, so they can be
//! rendered inline.

pub mod config;
pub mod error;
pub mod import;
pub mod item;
pub mod playback;
pub mod queue;
pub mod registry;
pub mod session;
pub mod youtube;

pub use config::{AppConfig, default_storage_directory};
pub use error::{Error, FileSystemError, ImportError, MetadataError, Result};
pub use import::{
    BatchSummary, COL_ARTIST, COL_FILE_NAME, COL_NOTES, COL_ORDER, COL_SONG_NAME, COL_SOURCE,
    COL_YOUTUBE_URL, DroppedFile, VIDEO_EXTENSIONS, import_playlist, is_playlist_file,
    is_video_file, local_item_from_file_name, process_file_batch, scan_directory,
};
pub use item::{
    ItemStatus, PlaylistItem, SourceType, UNKNOWN_ARTIST, UNKNOWN_TITLE, fallback_item_id,
    new_item_id,
};
pub use playback::{PlaybackResolver, PlaybackSource, Resolution};
pub use queue::{DEFAULT_VOLUME, NO_SELECTION, QueueEvent, QueueManager};
pub use registry::{MediaHandle, MediaRegistry};
pub use session::{STORAGE_KEY, SessionState, SessionStore, default_session_path};
pub use youtube::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_METADATA_ENDPOINT, MetadataFetcher, NoembedFetcher,
    VideoMetadata, extract_video_id, youtube_item_from_input,
};
