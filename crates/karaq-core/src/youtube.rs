//! YouTube link utilities and metadata enrichment.
//!
//! Link parsing is pure: [`extract_video_id`] pulls a normalized
//! 11-character video identifier out of arbitrary pasted text without
//! touching the network. Enrichment is a separate, best-effort concern:
//! [`MetadataFetcher`] looks up a display title/author for an identifier
//! via an oEmbed proxy, and callers fall back to placeholder text when the
//! lookup fails.

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MetadataError, Result};
use crate::item::{PlaylistItem, SourceType, UNKNOWN_ARTIST};

/// Default oEmbed proxy endpoint used for metadata enrichment.
pub const DEFAULT_METADATA_ENDPOINT: &str = "https://noembed.com";

/// Default timeout for a metadata lookup.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Length of a normalized YouTube video identifier.
const VIDEO_ID_LEN: usize = 11;

/// Extract a YouTube video identifier from arbitrary user-entered text.
///
/// Recognized forms:
/// - full watch URLs with a `v=` query parameter
///   (`https://www.youtube.com/watch?v=dQw4w9WgXcQ`),
/// - short links (`https://youtu.be/dQw4w9WgXcQ`),
/// - embed paths (`https://www.youtube.com/embed/dQw4w9WgXcQ`),
/// - best-effort: a bare 11-character identifier-shaped token.
///
/// Returns the first syntactically valid identifier found, or `None` when
/// the input is not link-shaped. Never panics and performs no I/O.
#[must_use]
pub fn extract_video_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let link_re = Regex::new(
        r"(?i:youtube\.com/watch\?(?:[^#\s]*&)?v=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]+)",
    )
    .ok()?;

    if let Some(caps) = link_re.captures(trimmed) {
        let candidate = caps.get(1)?.as_str();
        // Link-shaped input with a malformed identifier is rejected, not
        // salvaged.
        if candidate.len() == VIDEO_ID_LEN {
            return Some(candidate.to_string());
        }
        return None;
    }

    let bare_re = Regex::new(r"^[A-Za-z0-9_-]{11}$").ok()?;
    if bare_re.is_match(trimmed) {
        return Some(trimmed.to_string());
    }

    None
}

/// Display metadata for a video, as returned by the enrichment endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video title.
    pub title: String,
    /// Channel/uploader name.
    pub author: String,
}

/// Metadata lookup by video identifier.
///
/// Implementations must be best-effort and bounded: a slow or failing
/// endpoint returns an error, it never blocks queue mutation.
#[cfg_attr(test, mockall::automock)]
pub trait MetadataFetcher: Send + Sync {
    /// Look up title and author for a video identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unreachable, times out, or
    /// answers with an uninterpretable payload.
    fn fetch(&self, video_id: &str) -> Result<VideoMetadata>;
}

/// Shape of the oEmbed proxy response; only the fields we read.
#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: Option<String>,
    author_name: Option<String>,
    error: Option<String>,
}

/// [`MetadataFetcher`] backed by the noembed oEmbed proxy.
#[derive(Debug, Clone)]
pub struct NoembedFetcher {
    endpoint: String,
    timeout: Duration,
}

impl NoembedFetcher {
    /// Create a fetcher against the default endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_METADATA_ENDPOINT)
    }

    /// Create a fetcher against a custom oEmbed-compatible endpoint.
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    /// Override the lookup timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for NoembedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataFetcher for NoembedFetcher {
    fn fetch(&self, video_id: &str) -> Result<VideoMetadata> {
        let url = format!(
            "{}/embed?url=https://www.youtube.com/watch?v={video_id}",
            self.endpoint.trim_end_matches('/')
        );
        debug!("Fetching video metadata: {}", url);

        let client = reqwest::blocking::Client::new();
        let response = client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .map_err(|e| MetadataError::FetchFailed {
                video_id: video_id.to_string(),
                reason: e.to_string(),
            })?;

        let body: OembedResponse =
            response.json().map_err(|e| MetadataError::InvalidResponse {
                video_id: video_id.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(error) = body.error {
            return Err(MetadataError::InvalidResponse {
                video_id: video_id.to_string(),
                reason: error,
            }
            .into());
        }

        Ok(VideoMetadata {
            title: body.title.unwrap_or_else(|| "YouTube Video".to_string()),
            author: body
                .author_name
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        })
    }
}

/// Build a queue entry from arbitrary pasted text.
///
/// When an identifier can be extracted, the entry is enriched through
/// `fetcher`; a failed lookup falls back to the input text as the title
/// and never blocks the add. When no identifier is found, the entry is
/// still produced — tagged ERROR with the input as its title — so the user
/// sees and can fix it inline.
pub fn youtube_item_from_input(
    input: &str,
    order: i64,
    fetcher: &dyn MetadataFetcher,
) -> PlaylistItem {
    let trimmed = input.trim();

    let mut item = match extract_video_id(trimmed) {
        Some(video_id) => {
            let (title, artist) = match fetcher.fetch(&video_id) {
                Ok(meta) => (meta.title, meta.author),
                Err(e) => {
                    warn!("Metadata lookup failed, using placeholder: {}", e);
                    (trimmed.to_string(), UNKNOWN_ARTIST.to_string())
                }
            };
            PlaylistItem::new(SourceType::Youtube)
                .with_title(title)
                .with_artist(artist)
                .with_youtube(trimmed, Some(video_id))
        }
        None => PlaylistItem::new(SourceType::Youtube)
            .with_title(trimmed)
            .with_notes("Search result"),
    }
    .with_order(order);

    item.apply_validation();
    item
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::item::ItemStatus;

    #[test]
    fn test_extract_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?t=42&v=dQw4w9WgXcQ&list=PLx"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_short_link() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=10"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_embed_path() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_bare_token() {
        assert_eq!(
            extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("  dQw4w9WgXcQ  "),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_rejects_non_links() {
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ"), None);
        // Link-shaped but malformed identifier
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
        // Bare token of the wrong length
        assert_eq!(extract_video_id("abcdefghij"), None);
    }

    #[test]
    fn test_extract_does_not_fetch_or_mutate() {
        let input = "https://youtu.be/dQw4w9WgXcQ";
        let _ = extract_video_id(input);
        assert_eq!(input, "https://youtu.be/dQw4w9WgXcQ");
    }

    #[test]
    fn test_item_from_link_enriched() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher.expect_fetch().returning(|_| {
            Ok(VideoMetadata {
                title: "Never Gonna Give You Up".to_string(),
                author: "Rick Astley".to_string(),
            })
        });

        let item = youtube_item_from_input("https://youtu.be/dQw4w9WgXcQ", 3, &fetcher);
        assert_eq!(item.source, SourceType::Youtube);
        assert_eq!(item.status, ItemStatus::Ready);
        assert_eq!(item.title, "Never Gonna Give You Up");
        assert_eq!(item.artist, "Rick Astley");
        assert_eq!(item.youtube_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(item.order, 3);
    }

    #[test]
    fn test_item_from_link_fetch_failure_falls_back() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher.expect_fetch().returning(|id| {
            Err(MetadataError::FetchFailed {
                video_id: id.to_string(),
                reason: "timeout".to_string(),
            }
            .into())
        });

        let item = youtube_item_from_input("https://youtu.be/dQw4w9WgXcQ", 1, &fetcher);
        // The add still happens, with the input text as placeholder title.
        assert_eq!(item.status, ItemStatus::Ready);
        assert_eq!(item.title, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(item.artist, UNKNOWN_ARTIST);
        assert_eq!(item.youtube_id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_item_from_non_link_is_error() {
        let fetcher = MockMetadataFetcher::new();
        let item = youtube_item_from_input("some song name", 5, &fetcher);
        assert_eq!(item.status, ItemStatus::Error);
        assert_eq!(item.title, "some song name");
        assert!(item.youtube_id.is_none());
        assert_eq!(item.notes.as_deref(), Some("Search result"));
    }
}
