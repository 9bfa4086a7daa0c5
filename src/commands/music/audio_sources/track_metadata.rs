//! Defines the `TrackMetadata` struct, the extracted information needed to show
//! and stream a track, and the conversion from `yt-dlp --dump-json` output.

use crate::commands::music::utils::music_manager::MusicError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::process::Output;
use std::sync::LazyLock;
use std::time::Duration;

/// Matches the `ERROR: ...` line `yt-dlp` prints on stderr.
static YTDLP_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ERROR:\s*(.+)$").expect("valid regex"));

/// Extracted metadata for a playable track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackMetadata {
    /// The title of the track.
    pub title: String,
    /// The page URL the track was requested with.
    pub source_url: String,
    /// Direct media URL. These are time-limited tokens issued by the source.
    pub stream_url: String,
    /// Headers the source expects when the stream URL is fetched.
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
    /// The duration of the track, if available.
    #[serde(with = "humantime_serde", default)]
    pub duration: Option<Duration>,
    /// URL to a thumbnail image for the track, if available.
    pub thumbnail: Option<String>,
}

/// The subset of `yt-dlp -j` output we use.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
}

impl TrackMetadata {
    /// Parses a single `yt-dlp --dump-json` document.
    ///
    /// `requested_url` is used as the source URL when `webpage_url` is absent.
    pub fn from_ytdlp_json(json: &str, requested_url: &str) -> Result<Self, MusicError> {
        let info: YtDlpInfo = serde_json::from_str(json).map_err(|e| {
            MusicError::ExtractionError(format!("Failed to parse video metadata: {}", e))
        })?;

        let stream_url = info
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                MusicError::ExtractionError(format!("No audio stream found for {}", requested_url))
            })?;

        Ok(Self {
            title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
            source_url: info
                .webpage_url
                .unwrap_or_else(|| requested_url.to_string()),
            stream_url,
            http_headers: info.http_headers,
            duration: info
                .duration
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64),
            thumbnail: info.thumbnail,
        })
    }

    /// Converts a finished `yt-dlp` process into metadata, surfacing its error line on failure.
    pub fn from_ytdlp_output(output: Output, requested_url: &str) -> Result<Self, MusicError> {
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::ExtractionError(ytdlp_error_message(&stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::from_ytdlp_json(stdout.trim(), requested_url)
    }
}

/// Picks the most useful line out of `yt-dlp`'s stderr.
pub fn ytdlp_error_message(stderr: &str) -> String {
    if let Some(captures) = YTDLP_ERROR.captures(stderr) {
        return captures[1].trim().to_string();
    }

    stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("yt-dlp exited without output")
        .to_string()
}
