//! This module defines the structure and traits for handling audio sources.
//! It provides a common interface (`MetadataExtractor`) for turning a source URL
//! into playable track metadata, plus the host allow-list used by `/play`.

/// Submodule defining the `TrackMetadata` struct used across audio sources.
pub mod track_metadata;
/// Submodule implementing the `MetadataExtractor` trait with `yt-dlp`.
pub mod youtube;

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
#[cfg(test)]
use mockall::automock;
use serenity::async_trait;
pub use track_metadata::TrackMetadata;
use url::Url;

/// Hostname fragments a `/play` URL must contain.
pub const ACCEPTED_HOSTS: [&str; 2] = ["youtube.com", "youtu.be"];

/// Trait defining the interface of an external metadata extraction service.
/// Requires `Send + Sync` to be safely shared between session tasks.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Fetches metadata, including a direct stream URL, for the given source URL.
    ///
    /// Malformed or unsupported URLs yield `MusicError::ExtractionError`.
    async fn extract(&self, url: &str) -> MusicResult<TrackMetadata>;
}

/// Checks that `input` parses as an http(s) URL whose host is on the allow-list.
///
/// Links pasted without a scheme (`youtu.be/...`) are read as `https://`.
pub fn validate_source_url(input: &str) -> MusicResult<Url> {
    let trimmed = input.trim();
    let url = match trimmed.contains("://") {
        true => Url::parse(trimmed),
        false => Url::parse(&format!("https://{}", trimmed)),
    }
    .map_err(|_| MusicError::InvalidUrl(input.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(MusicError::InvalidUrl(input.to_string()));
    }

    let accepted = url
        .host_str()
        .is_some_and(|host| ACCEPTED_HOSTS.iter().any(|accepted| host.contains(accepted)));

    if accepted {
        Ok(url)
    } else {
        Err(MusicError::InvalidUrl(input.to_string()))
    }
}
