//! Implements the `MetadataExtractor` trait for YouTube.
//! Uses the `yt-dlp` command-line tool for extracting information.

use serenity::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{MetadataExtractor, TrackMetadata};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

/// Audio-only formats, preferring containers symphonia can demux.
const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio[ext=webm]/bestaudio";

/// Extracts YouTube metadata by shelling out to `yt-dlp`.
pub struct YoutubeApi {
    ytdlp_path: String,
}

impl Default for YoutubeApi {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YoutubeApi {
    pub fn new(ytdlp_path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
        }
    }

    /// Arguments passed to `yt-dlp` for a single URL.
    fn args(url: &str) -> [&str; 6] {
        [
            "-j",            // Output as JSON
            "--no-playlist", // Don't process playlists
            "--no-warnings",
            "-f",
            AUDIO_FORMAT,
            url,
        ]
    }
}

#[async_trait]
impl MetadataExtractor for YoutubeApi {
    async fn extract(&self, url: &str) -> MusicResult<TrackMetadata> {
        info!("Extracting YouTube metadata for URL: {}", url);

        let output = Command::new(&self.ytdlp_path)
            .args(Self::args(url))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                MusicError::ExtractionError(format!("Failed to execute {}: {}", self.ytdlp_path, e))
            })?;

        let metadata = TrackMetadata::from_ytdlp_output(output, url)?;
        debug!("Extracted '{}' from {}", metadata.title, url);

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_args_request_single_audio_only_json() {
        let args = YoutubeApi::args("https://youtu.be/abc");
        assert_eq!(args[0], "-j");
        assert!(args.contains(&"--no-playlist"));
        assert!(args.contains(&AUDIO_FORMAT));
        assert_eq!(args.last(), Some(&"https://youtu.be/abc"));
    }

    #[test]
    fn test_missing_binary_is_extraction_error() {
        let api = YoutubeApi::new("/nonexistent/yt-dlp-binary");
        let result = tokio_test::block_on(api.extract("https://youtu.be/abc"));
        assert_matches!(result, Err(MusicError::ExtractionError(msg)) if msg.contains("Failed to execute"));
    }
}
