//! Sample tracks and URLs

use fake::Fake;
use fake::faker::lorem::en::Sentence;
use std::collections::HashMap;
use std::time::Duration;
use tunebot::commands::music::audio_sources::TrackMetadata;

pub const SONG_A: &str = "https://www.youtube.com/watch?v=aaaaaaaaaaa";
pub const SONG_B: &str = "https://www.youtube.com/watch?v=bbbbbbbbbbb";
pub const SONG_C: &str = "https://youtu.be/ccccccccccc";

pub const VOICE_CHANNEL: u64 = 987654321;

/// The direct media URL the fake extractor hands out for `url`
pub fn stream_url_for(url: &str) -> String {
    format!("https://rr1.media.example/videoplayback?src={}", url)
}

/// Metadata for `url` with a random title
pub fn track(url: &str) -> TrackMetadata {
    TrackMetadata {
        title: Sentence(2..5).fake(),
        source_url: url.to_string(),
        stream_url: stream_url_for(url),
        http_headers: HashMap::from([("User-Agent".to_string(), "Mozilla/5.0".to_string())]),
        duration: Some(Duration::from_secs((60..600).fake())),
        thumbnail: None,
    }
}
