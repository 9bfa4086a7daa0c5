use crate::commands::music::audio_sources::{MetadataExtractor, TrackMetadata};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

struct CacheEntry {
    metadata: TrackMetadata,
    fetched_at: Instant,
}

/// In-memory cache mapping source URL -> extracted `TrackMetadata`.
///
/// Bounded by `capacity` (oldest fetch evicted first) and by `ttl`, since the
/// direct stream URLs inside the metadata expire on the source's side.
pub struct TrackCache {
    entries: DashMap<String, CacheEntry>,
    capacity: usize,
    ttl: Duration,
}

impl TrackCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Attempts to retrieve fresh cached metadata for a URL.
    ///
    /// An expired entry is dropped and reported as `MusicError::StaleMetadata`.
    pub fn lookup(&self, url: &str) -> MusicResult<Option<TrackMetadata>> {
        match self.entries.get(url) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                debug!("Cache hit for URL: {}", url);
                return Ok(Some(entry.metadata.clone()));
            }
            Some(_) => {}
            None => {
                debug!("Cache miss for URL: {}", url);
                return Ok(None);
            }
        }

        self.entries.remove(url);
        Err(MusicError::StaleMetadata(url.to_string()))
    }

    /// Caches the metadata for a URL, evicting the oldest entry when full.
    pub fn insert(&self, url: &str, metadata: TrackMetadata) {
        if !self.entries.contains_key(url) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        info!("Caching metadata for URL: {}", url);
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                metadata,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Returns cached metadata for `url`, fetching it with `extractor` on a miss
    /// or when the cached copy has gone stale.
    pub async fn resolve(
        &self,
        url: &str,
        extractor: &dyn MetadataExtractor,
    ) -> MusicResult<TrackMetadata> {
        match self.lookup(url) {
            Ok(Some(metadata)) => return Ok(metadata),
            Ok(None) => {}
            Err(MusicError::StaleMetadata(_)) => {
                info!("Cached metadata for {} expired, refreshing", url);
            }
            Err(err) => return Err(err),
        }

        let metadata = extractor.extract(url).await?;
        self.insert(url, metadata.clone());
        Ok(metadata)
    }

    pub fn invalidate(&self, url: &str) -> bool {
        self.entries.remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.fetched_at)
            .map(|entry| entry.key().clone());

        if let Some(url) = oldest {
            debug!("Cache full, evicting {}", url);
            self.entries.remove(&url);
        }
    }
}
