//! Error types for Karaq core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Karaq core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Playlist import failed.
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Metadata enrichment failed.
    #[error("Metadata lookup failed: {0}")]
    Metadata(#[from] MetadataError),

    /// File system operation failed.
    #[error("File system error: {0}")]
    FileSystem(#[from] FileSystemError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while decoding a bulk-import payload.
///
/// These abort the whole import call; per-row validation problems never
/// surface here — they are tagged on the returned entries instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The byte stream is not a decodable spreadsheet.
    #[error("Not a readable spreadsheet: {reason}")]
    UnreadableWorkbook {
        /// Decoder diagnostic.
        reason: String,
    },

    /// The workbook decoded but contains no sheets at all.
    #[error("Workbook contains no sheets")]
    NoSheets,
}

/// Errors raised by the best-effort metadata enrichment lookup.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The enrichment endpoint could not be reached or timed out.
    #[error("Metadata fetch failed for video {video_id}: {reason}")]
    FetchFailed {
        /// Video identifier the lookup was for.
        video_id: String,
        /// Transport diagnostic.
        reason: String,
    },

    /// The endpoint answered with a payload we could not interpret.
    #[error("Invalid metadata response for video {video_id}: {reason}")]
    InvalidResponse {
        /// Video identifier the lookup was for.
        video_id: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// File system errors with the offending path attached.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// Reading a file failed.
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// Path where the error occurred.
        path: PathBuf,
        /// Error message.
        reason: String,
    },

    /// Writing a file failed.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Path where the error occurred.
        path: PathBuf,
        /// Error message.
        reason: String,
    },

    /// Creating a directory failed.
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirFailed {
        /// Path where the error occurred.
        path: PathBuf,
        /// Error message.
        reason: String,
    },
}
