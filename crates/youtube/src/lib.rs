//! REST client for the YouTube Data API v3.
//!
//! Wraps the two endpoints the resource normalizer needs -- `videos.list`
//! (title, duration, thumbnail) and `playlistItems.list` (playlist
//! expansion) -- using [`reqwest`], plus the pure URL/duration parsing that
//! goes with them. Durations are rounded *up* to whole minutes so a
//! 30-second video still contributes time.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

/// Base URL for the YouTube Data API v3.
const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Page size for playlist expansion (the API maximum).
const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Batch size for `videos.list` id lookups (the API maximum).
const VIDEO_BATCH_SIZE: usize = 50;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the YouTube API layer.
#[derive(Debug, thiserror::Error)]
pub enum YouTubeError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("YouTube API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider returned no match for the requested id.
    #[error("No YouTube video found for id '{0}'")]
    NotFound(String),

    /// A URL or duration string could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the YouTube client.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    /// Data API key.
    pub api_key: String,
}

impl YouTubeConfig {
    /// Load configuration from the environment.
    ///
    /// Returns `None` if `YOUTUBE_API_KEY` is not set, signalling that
    /// YouTube resources cannot be normalized in this deployment.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("YOUTUBE_API_KEY").ok()?;
        Some(Self { api_key })
    }
}

// ---------------------------------------------------------------------------
// Fetched metadata
// ---------------------------------------------------------------------------

/// Metadata for a single video, as the normalizer consumes it.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    /// Length in whole minutes, rounded up.
    pub duration_mins: i64,
    pub thumbnail_url: Option<String>,
}

impl VideoMetadata {
    /// Canonical watch URL used as the resource's dedup key.
    pub fn watch_url(&self) -> String {
        watch_url(&self.video_id)
    }
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the YouTube Data API.
pub struct YouTubeClient {
    client: reqwest::Client,
    config: YouTubeConfig,
}

impl YouTubeClient {
    /// Create a new client with the given configuration.
    pub fn new(config: YouTubeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch metadata for a single video. Fails with
    /// [`YouTubeError::NotFound`] when the provider has no match.
    pub async fn fetch_video(&self, video_id: &str) -> Result<VideoMetadata, YouTubeError> {
        let mut videos = self.fetch_videos(&[video_id.to_string()]).await?;
        videos
            .pop()
            .ok_or_else(|| YouTubeError::NotFound(video_id.to_string()))
    }

    /// Fetch metadata for a batch of videos, in API batches of 50.
    ///
    /// Ids the provider does not know are silently absent from the result;
    /// callers that require every id check the count themselves.
    pub async fn fetch_videos(&self, video_ids: &[String]) -> Result<Vec<VideoMetadata>, YouTubeError> {
        let mut out = Vec::with_capacity(video_ids.len());

        for chunk in video_ids.chunks(VIDEO_BATCH_SIZE) {
            let ids = chunk.join(",");
            let response = self
                .client
                .get(format!("{API_BASE}/videos"))
                .query(&[
                    ("part", "snippet,contentDetails"),
                    ("id", ids.as_str()),
                    ("key", self.config.api_key.as_str()),
                ])
                .send()
                .await?;

            let parsed: VideoListResponse = Self::parse_response(response).await?;
            for item in parsed.items {
                out.push(VideoMetadata {
                    duration_mins: parse_iso8601_minutes(&item.content_details.duration)?,
                    thumbnail_url: item.snippet.thumbnails.best_url(),
                    title: item.snippet.title,
                    video_id: item.id,
                });
            }
        }

        Ok(out)
    }

    /// Expand a playlist into its video ids, following pagination.
    ///
    /// Any page failure is returned as-is: playlist import is all-or-
    /// nothing, never partial.
    pub async fn fetch_playlist_video_ids(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<String>, YouTubeError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        let max_results = PLAYLIST_PAGE_SIZE.to_string();
        loop {
            let mut request = self
                .client
                .get(format!("{API_BASE}/playlistItems"))
                .query(&[
                    ("part", "contentDetails"),
                    ("playlistId", playlist_id),
                    ("maxResults", max_results.as_str()),
                    ("key", self.config.api_key.as_str()),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let parsed: PlaylistItemsResponse = Self::parse_response(response).await?;

            ids.extend(parsed.items.into_iter().map(|i| i.content_details.video_id));

            match parsed.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        if ids.is_empty() {
            return Err(YouTubeError::NotFound(playlist_id.to_string()));
        }
        Ok(ids)
    }

    // ---- private helpers ----

    /// Check the status code and deserialize the body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, YouTubeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    /// Highest-quality thumbnail the provider offered.
    fn best_url(self) -> Option<String> {
        self.high
            .or(self.medium)
            .or(self.default)
            .map(|t| t.url)
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

// ---------------------------------------------------------------------------
// URL / duration parsing
// ---------------------------------------------------------------------------

fn video_id_regexes() -> &'static [Regex; 4] {
    static RES: OnceLock<[Regex; 4]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"youtube\.com/watch\?[^#]*\bv=([A-Za-z0-9_-]{11})").unwrap(),
            Regex::new(r"youtu\.be/([A-Za-z0-9_-]{11})").unwrap(),
            Regex::new(r"youtube\.com/embed/([A-Za-z0-9_-]{11})").unwrap(),
            Regex::new(r"youtube\.com/shorts/([A-Za-z0-9_-]{11})").unwrap(),
        ]
    })
}

/// Extract the 11-character video id from any of the common URL forms
/// (watch, youtu.be, embed, shorts).
pub fn extract_video_id(url: &str) -> Result<String, YouTubeError> {
    for re in video_id_regexes() {
        if let Some(caps) = re.captures(url) {
            return Ok(caps[1].to_string());
        }
    }
    Err(YouTubeError::Parse(format!(
        "Could not extract a video id from '{url}'"
    )))
}

/// Extract the playlist id from a URL's `list=` parameter.
pub fn extract_playlist_id(url: &str) -> Result<String, YouTubeError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").unwrap());
    re.captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            YouTubeError::Parse(format!("Could not extract a playlist id from '{url}'"))
        })
}

/// Parse an ISO-8601 duration (`PT1H2M30S`, `P1DT2H`, ...) into whole
/// minutes, rounded up.
pub fn parse_iso8601_minutes(duration: &str) -> Result<i64, YouTubeError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap()
    });

    let caps = re
        .captures(duration)
        .ok_or_else(|| YouTubeError::Parse(format!("Invalid ISO-8601 duration '{duration}'")))?;

    let group = |i: usize| -> i64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let total_secs =
        group(1) * 86_400 + group(2) * 3_600 + group(3) * 60 + group(4);
    Ok((total_secs + 59) / 60)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- video id extraction --

    #[test]
    fn extracts_watch_url() {
        let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn extracts_watch_url_with_extra_params() {
        let id =
            extract_video_id("https://www.youtube.com/watch?t=10&v=dQw4w9WgXcQ&feature=share")
                .unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn extracts_short_url() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn extracts_embed_url() {
        let id = extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn extracts_shorts_url() {
        let id = extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn rejects_non_video_url() {
        assert!(extract_video_id("https://example.com/watch?v=nope").is_err());
        assert!(extract_video_id("https://www.youtube.com/").is_err());
    }

    // -- playlist id extraction --

    #[test]
    fn extracts_playlist_id() {
        let id = extract_playlist_id(
            "https://www.youtube.com/playlist?list=PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf",
        )
        .unwrap();
        assert_eq!(id, "PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf");
    }

    #[test]
    fn extracts_playlist_id_from_watch_url() {
        let id = extract_playlist_id(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabc123_-",
        )
        .unwrap();
        assert_eq!(id, "PLabc123_-");
    }

    #[test]
    fn rejects_url_without_list_param() {
        assert!(extract_playlist_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_err());
    }

    // -- duration parsing --

    #[test]
    fn parses_hours_minutes_seconds() {
        assert_eq!(parse_iso8601_minutes("PT1H2M30S").unwrap(), 63);
    }

    #[test]
    fn parses_minutes_only() {
        assert_eq!(parse_iso8601_minutes("PT15M").unwrap(), 15);
    }

    #[test]
    fn rounds_seconds_up() {
        assert_eq!(parse_iso8601_minutes("PT30S").unwrap(), 1);
        assert_eq!(parse_iso8601_minutes("PT4M1S").unwrap(), 5);
    }

    #[test]
    fn parses_days() {
        assert_eq!(parse_iso8601_minutes("P1DT1M").unwrap(), 24 * 60 + 1);
    }

    #[test]
    fn zero_duration_is_zero() {
        assert_eq!(parse_iso8601_minutes("PT0S").unwrap(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_iso8601_minutes("1h30m").is_err());
        assert!(parse_iso8601_minutes("").is_err());
    }

    // -- canonical URL --

    #[test]
    fn watch_url_round_trips_through_extraction() {
        let url = watch_url("dQw4w9WgXcQ");
        assert_eq!(extract_video_id(&url).unwrap(), "dQw4w9WgXcQ");
    }

    // -- error display --

    #[test]
    fn api_error_display() {
        let err = YouTubeError::Api {
            status: 403,
            body: "quota exceeded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "YouTube API error (403): quota exceeded"
        );
    }
}
