//! Bulk playlist import and dropped-file intake.
//!
//! The import pipeline turns a tabular byte payload (XLSX/XLS/ODS workbook
//! or CSV) into validated queue entries. Only a structurally undecodable
//! payload fails the call; per-row problems are tagged on the entry
//! (`status = ERROR`) and never drop the row, so the user can see and fix
//! them inline.
//!
//! The batch intake mirrors a drag-and-drop: media handles are registered
//! for every video file before any queue mutation, then the queue is
//! either replaced by a decoded playlist or fed the raw video files.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use tracing::{debug, info, warn};

use crate::error::{Error, FileSystemError, ImportError, Result};
use crate::item::{PlaylistItem, SourceType};
use crate::queue::QueueManager;
use crate::registry::{MediaHandle, MediaRegistry};
use crate::youtube::extract_video_id;

/// Canonical column header: initial sort key.
pub const COL_ORDER: &str = "Order";
/// Canonical column header: media source (`LOCAL` | `YOUTUBE`).
pub const COL_SOURCE: &str = "Source";
/// Canonical column header: display title.
pub const COL_SONG_NAME: &str = "Song Name";
/// Canonical column header: display artist.
pub const COL_ARTIST: &str = "Artist";
/// Canonical column header: backing file name for LOCAL rows.
pub const COL_FILE_NAME: &str = "File Name";
/// Canonical column header: link for YOUTUBE rows.
pub const COL_YOUTUBE_URL: &str = "YouTube URL";
/// Canonical column header: free-text notes.
pub const COL_NOTES: &str = "Notes";

/// File name suffixes classified as raw video media.
pub const VIDEO_EXTENSIONS: [&str; 7] = ["mkv", "avi", "mov", "mp4", "webm", "3gp", "wmv"];

/// File name suffixes classified as bulk playlist files.
const PLAYLIST_EXTENSIONS: [&str; 2] = ["xlsx", "csv"];

/// Import a playlist from a tabular byte payload.
///
/// The format is sniffed from the leading bytes: ZIP or CFB containers go
/// through the workbook decoder (first sheet only), anything else is read
/// as CSV. Rows are mapped through the canonical headers, validated per
/// source type, and returned stable-sorted ascending by their effective
/// order (ties keep original row order). An empty sheet yields an empty
/// vector.
///
/// # Errors
///
/// Returns [`ImportError`] when the payload is not a decodable spreadsheet.
pub fn import_playlist(bytes: &[u8]) -> Result<Vec<PlaylistItem>> {
    let rows = if looks_like_workbook(bytes) {
        workbook_rows(bytes)?
    } else {
        csv_rows(bytes)?
    };

    let Some((headers, data_rows)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    let mut items: Vec<PlaylistItem> = data_rows
        .iter()
        .enumerate()
        .map(|(index, cells)| {
            let record = RowRecord {
                headers: headers.as_slice(),
                cells: cells.as_slice(),
            };
            item_from_row(&record, index + 1)
        })
        .collect();

    // Stable: ties preserve original row order.
    items.sort_by_key(|item| item.order);

    info!("Imported {} playlist entries", items.len());
    Ok(items)
}

/// Whether the payload is a binary workbook container (ZIP for XLSX/ODS,
/// CFB for legacy XLS).
fn looks_like_workbook(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK") || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0])
}

/// Decode the first sheet of a workbook into string rows.
fn workbook_rows(bytes: &[u8]) -> Result<Vec<Vec<Option<String>>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        ImportError::UnreadableWorkbook {
            reason: e.to_string(),
        }
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoSheets)?
        .map_err(|e| ImportError::UnreadableWorkbook {
            reason: e.to_string(),
        })?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

/// Decode a CSV payload into string rows (header row included).
fn csv_rows(bytes: &[u8]) -> Result<Vec<Vec<Option<String>>>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<Option<String>> = reader
        .headers()
        .map_err(|e| ImportError::UnreadableWorkbook {
            reason: e.to_string(),
        })?
        .iter()
        .map(|h| Some(h.to_string()))
        .collect();

    let mut rows = vec![headers];
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::UnreadableWorkbook {
            reason: e.to_string(),
        })?;
        rows.push(
            record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(rows)
}

/// Render a workbook cell as text, or `None` for empty/error cells.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            if s.is_empty() {
                None
            } else {
                Some(s.clone())
            }
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => {
            // Whole-number floats render without the trailing ".0" so
            // numeric order cells look the way they do in the sheet.
            if f.fract() == 0.0 && f.abs() < 1e15 {
                Some(format!("{}", *f as i64))
            } else {
                Some(f.to_string())
            }
        }
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// One data row keyed through the header row by exact header text.
struct RowRecord<'a> {
    headers: &'a [Option<String>],
    cells: &'a [Option<String>],
}

impl RowRecord<'_> {
    /// Value of the column whose header text equals `column`, if present
    /// and non-empty.
    fn field(&self, column: &str) -> Option<&str> {
        let index = self
            .headers
            .iter()
            .position(|h| h.as_deref() == Some(column))?;
        self.cells.get(index)?.as_deref()
    }
}

/// Build one queue entry from a data row. `row_number` is the row's
/// 1-based position in the sheet, used as the order fallback.
fn item_from_row(record: &RowRecord<'_>, row_number: usize) -> PlaylistItem {
    let source = match record.field(COL_SOURCE) {
        Some(raw) if raw.trim().eq_ignore_ascii_case("YOUTUBE") => SourceType::Youtube,
        _ => SourceType::Local,
    };

    let order = record
        .field(COL_ORDER)
        .and_then(parse_order)
        .unwrap_or(row_number as i64);

    let mut item = PlaylistItem::new(source).with_order(order);

    if let Some(title) = record.field(COL_SONG_NAME) {
        item.title = title.to_string();
    }
    if let Some(artist) = record.field(COL_ARTIST) {
        item.artist = artist.to_string();
    }
    if let Some(notes) = record.field(COL_NOTES) {
        item.notes = Some(notes.to_string());
    }
    if let Some(file_name) = record.field(COL_FILE_NAME) {
        item.file_name = Some(file_name.to_string());
    }
    if let Some(url) = record.field(COL_YOUTUBE_URL) {
        item.youtube_url = Some(url.to_string());
        item.youtube_id = extract_video_id(url);
    }

    item.apply_validation();
    item
}

/// Parse a numeric order cell. Accepts integers and whole-ish floats.
fn parse_order(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64)
    })
}

/// Whether a file classifies as raw video media, by reported media type
/// (`video/*`) or case-insensitive file name suffix.
#[must_use]
pub fn is_video_file(name: &str, media_type: Option<&str>) -> bool {
    if media_type.is_some_and(|t| t.starts_with("video/")) {
        return true;
    }
    let lower = name.to_lowercase();
    VIDEO_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// Whether a file classifies as a bulk playlist file.
#[must_use]
pub fn is_playlist_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    PLAYLIST_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// A file delivered by a drop or file picker: a name, the reported media
/// type (possibly absent), and the volatile content handle.
#[derive(Debug, Clone)]
pub struct DroppedFile {
    /// File name, as reported by the picker.
    pub name: String,
    /// Browser/OS reported media type, when available.
    pub media_type: Option<String>,
    /// Volatile content handle.
    pub handle: MediaHandle,
}

impl DroppedFile {
    /// Create a dropped-file record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        media_type: Option<impl Into<String>>,
        handle: MediaHandle,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(Into::into),
            handle,
        }
    }

    /// Whether this file classifies as raw video media.
    #[must_use]
    pub fn is_video(&self) -> bool {
        is_video_file(&self.name, self.media_type.as_deref())
    }
}

/// Outcome of a dropped-file batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of video handles registered.
    pub videos_registered: usize,
    /// Whether a bulk playlist file replaced the queue.
    pub playlist_loaded: bool,
    /// Number of entries added to the queue (replacement or raw import).
    pub items_queued: usize,
    /// Import diagnostic when a playlist candidate failed to decode.
    pub import_error: Option<String>,
}

/// Process one batch of dropped/selected files.
///
/// All video handles are registered in the registry before any queue
/// mutation, so playback resolution never races against registration for
/// files from the same batch. If the batch contains a playlist file that
/// decodes to a non-empty entry list, it replaces the queue; a decode
/// failure is captured in the summary and the batch falls back to raw
/// video import (one LOCAL entry per video file).
pub async fn process_file_batch(
    files: &[DroppedFile],
    registry: &mut MediaRegistry,
    queue: &QueueManager,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    let playlist_candidate = files.iter().find(|f| is_playlist_file(&f.name));
    let videos: Vec<&DroppedFile> = files.iter().filter(|f| f.is_video()).collect();

    debug!(
        "Processing batch: {} files, {} videos, playlist candidate: {}",
        files.len(),
        videos.len(),
        playlist_candidate.map_or("none", |f| f.name.as_str())
    );

    // Registration first; queue mutation only after every handle is in.
    for file in &videos {
        registry.register(file.name.clone(), file.handle.clone());
        summary.videos_registered += 1;
    }

    if let Some(candidate) = playlist_candidate {
        match playlist_bytes(candidate).and_then(import_playlist) {
            Ok(items) if !items.is_empty() => {
                summary.items_queued = items.len();
                summary.playlist_loaded = true;
                queue.set_playlist(items).await;
            }
            Ok(_) => {
                debug!("Playlist file {} decoded to no entries", candidate.name);
            }
            Err(e) => {
                warn!("Failed to import playlist {}: {}", candidate.name, e);
                summary.import_error = Some(e.to_string());
            }
        }
    }

    if !summary.playlist_loaded {
        for file in &videos {
            queue.add_to_queue(local_item_from_file_name(&file.name)).await;
            summary.items_queued += 1;
        }
        if !videos.is_empty() {
            info!("Queued {} raw video files", videos.len());
        }
    }

    summary
}

/// Borrow the raw bytes of a playlist candidate's handle.
fn playlist_bytes(file: &DroppedFile) -> Result<&[u8]> {
    match &file.handle {
        MediaHandle::Blob(bytes) => Ok(bytes.as_slice()),
        MediaHandle::Uri(_) => Err(ImportError::UnreadableWorkbook {
            reason: format!("{} is not backed by readable content", file.name),
        }
        .into()),
    }
}

/// Build a LOCAL queue entry straight from a video file name.
#[must_use]
pub fn local_item_from_file_name(name: &str) -> PlaylistItem {
    PlaylistItem::new(SourceType::Local)
        .with_title(file_stem(name))
        .with_artist("Local File")
        .with_file_name(name)
}

/// File name without its final extension.
fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Scan a directory for video and playlist files, reading each into a
/// dropped-file record. This backs the "add folder" flow.
///
/// # Errors
///
/// Returns an error if a matching file cannot be read.
pub fn scan_directory(dir: &Path) -> Result<Vec<DroppedFile>> {
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_video_file(name, None) && !is_playlist_file(name) {
            continue;
        }

        let bytes = std::fs::read(path).map_err(|e| {
            Error::FileSystem(FileSystemError::ReadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
        files.push(DroppedFile::new(
            name,
            None::<String>,
            MediaHandle::from_bytes(bytes),
        ));
    }

    debug!("Scanned {} media files from {}", files.len(), dir.display());
    Ok(files)
}
