use serenity::model::id::ChannelId;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::commands::music::audio_sources::{MetadataExtractor, TrackMetadata};

use super::queue_manager::{EntryId, QueueEntry, QueueStore};
use super::track_cache::TrackCache;
use super::voice::{StreamRequest, TrackEnd, VoiceConnector, VoiceSession};

/// Errors that can occur during music operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Please provide a valid YouTube URL (got `{0}`)")]
    InvalidUrl(String),

    #[error("You need to be in a voice channel to use this command")]
    UserNotInVoiceChannel,

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("No song is currently playing")]
    NothingPlaying,

    #[error("Failed to extract track metadata: {0}")]
    ExtractionError(String),

    #[error("Cached metadata for {0} has expired")]
    StaleMetadata(String),

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Failed to start playback: {0}")]
    PlaybackStartError(String),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Music session has shut down")]
    SessionClosed,
}

/// Coarse classification used to decide how an error is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Extraction,
    PlaybackStart,
    Platform,
}

impl MusicError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MusicError::NotInGuild
            | MusicError::InvalidUrl(_)
            | MusicError::UserNotInVoiceChannel
            | MusicError::NotConnected
            | MusicError::NothingPlaying => ErrorKind::Validation,
            MusicError::ExtractionError(_) | MusicError::StaleMetadata(_) => ErrorKind::Extraction,
            MusicError::NoVoiceManager
            | MusicError::JoinError(_)
            | MusicError::PlaybackStartError(_) => ErrorKind::PlaybackStart,
            MusicError::PlatformError(_) | MusicError::SessionClosed => ErrorKind::Platform,
        }
    }

    /// Whether a failure to start an entry should skip it and move on to the next one.
    pub fn is_skippable(&self) -> bool {
        matches!(self, MusicError::PlaybackStartError(_))
            || self.kind() == ErrorKind::Extraction
    }
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No voice session, or nothing playing on it
    Idle,
    Connecting,
    Playing,
    /// A stop was requested and the track end has not arrived yet
    Stopped,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Connecting => "connecting",
            PlaybackState::Playing => "playing",
            PlaybackState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Something the invoker (or the channel they played from) should be told.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    NowPlaying(TrackMetadata),
    Queued {
        metadata: TrackMetadata,
        position: usize,
    },
    /// An entry could not be played and was dropped from the queue
    Skipped { entry: QueueEntry, error: MusicError },
    /// Playback stopped advancing because of an error that is not entry-specific
    Halted(MusicError),
}

/// Owns the queue and the voice session of one guild and drives playback.
///
/// Not synchronised: the session actor is the only caller.
pub struct PlaybackController {
    queue: QueueStore,
    cache: Arc<TrackCache>,
    extractor: Arc<dyn MetadataExtractor>,
    connector: Box<dyn VoiceConnector>,
    voice: Option<Box<dyn VoiceSession>>,
    state: PlaybackState,
    now_playing: Option<EntryId>,
    track_ends: mpsc::UnboundedSender<TrackEnd>,
}

impl PlaybackController {
    pub fn new(
        cache: Arc<TrackCache>,
        extractor: Arc<dyn MetadataExtractor>,
        connector: Box<dyn VoiceConnector>,
        track_ends: mpsc::UnboundedSender<TrackEnd>,
    ) -> Self {
        Self {
            queue: QueueStore::new(),
            cache,
            extractor,
            connector,
            voice: None,
            state: PlaybackState::Idle,
            now_playing: None,
            track_ends,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut QueueStore {
        &mut self.queue
    }

    pub fn now_playing(&self) -> Option<EntryId> {
        self.now_playing
    }

    pub async fn is_connected(&self) -> bool {
        match &self.voice {
            Some(voice) => voice.is_connected().await,
            None => false,
        }
    }

    /// Join `channel` unless a live voice session already exists.
    pub async fn connect(&mut self, channel: Option<ChannelId>) -> MusicResult<()> {
        if self.is_connected().await {
            return Ok(());
        }

        let channel = channel.ok_or(MusicError::UserNotInVoiceChannel)?;
        info!("Joining voice channel {}", channel);

        self.state = PlaybackState::Connecting;
        match self.connector.join(channel).await {
            Ok(voice) => {
                self.voice = Some(voice);
                self.state = PlaybackState::Idle;
                self.now_playing = None;
                Ok(())
            }
            Err(err) => {
                error!("Failed to join voice channel {}: {}", channel, err);
                self.voice = None;
                self.state = PlaybackState::Idle;
                Err(err)
            }
        }
    }

    /// Resolve `url`, append it, and start playing if nothing else is.
    ///
    /// Extraction failures are returned without touching the queue.
    pub async fn enqueue(&mut self, url: &str) -> MusicResult<Vec<Notice>> {
        let metadata = self.cache.resolve(url, self.extractor.as_ref()).await?;
        let id = self.queue.enqueue(url, metadata.title.clone());
        debug!("Enqueued {} '{}'", id, metadata.title);

        if self.state == PlaybackState::Idle {
            return Ok(self.play_next().await);
        }

        let position = self.queue.position(id).unwrap_or(self.queue.len());
        Ok(vec![Notice::Queued { metadata, position }])
    }

    /// Start the head of the queue, dropping entries that cannot be started.
    pub async fn play_next(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();

        loop {
            let Some(entry) = self.queue.head().cloned() else {
                info!("Queue is empty, nothing left to play");
                self.state = PlaybackState::Idle;
                self.now_playing = None;
                return notices;
            };

            match self.start(&entry).await {
                Ok(metadata) => {
                    info!("Now playing {} '{}'", entry.id, metadata.title);
                    self.state = PlaybackState::Playing;
                    self.now_playing = Some(entry.id);
                    notices.push(Notice::NowPlaying(metadata));
                    return notices;
                }
                Err(err) if err.is_skippable() => {
                    warn!("Skipping {} ({}): {}", entry.id, entry.url, err);
                    self.queue.remove(entry.id);
                    notices.push(Notice::Skipped { entry, error: err });
                }
                Err(err) => {
                    error!("Playback halted at {}: {}", entry.id, err);
                    self.state = PlaybackState::Idle;
                    self.now_playing = None;
                    notices.push(Notice::Halted(err));
                    return notices;
                }
            }
        }
    }

    async fn start(&mut self, entry: &QueueEntry) -> MusicResult<TrackMetadata> {
        if self.voice.is_none() {
            return Err(MusicError::NotConnected);
        }

        let metadata = self.cache.resolve(&entry.url, self.extractor.as_ref()).await?;
        self.queue.set_title(entry.id, metadata.title.clone());

        let request = StreamRequest {
            entry: entry.id,
            stream_url: metadata.stream_url.clone(),
            http_headers: metadata.http_headers.clone(),
        };

        let voice = self.voice.as_mut().ok_or(MusicError::NotConnected)?;
        if let Err(err) = voice.play(request, self.track_ends.clone()).await {
            // The stream URL may be the expired one; make the next attempt re-extract.
            self.cache.invalidate(&entry.url);
            return Err(err);
        }

        Ok(metadata)
    }

    /// React to a track finishing. Only the entry currently playing is popped.
    pub async fn handle_track_end(&mut self, end: TrackEnd) -> Vec<Notice> {
        if let Some(err) = &end.error {
            warn!("Track {} ended with error: {}", end.entry, err);
        }

        if self.now_playing != Some(end.entry) {
            debug!(
                "Ignoring end of {} (current: {:?})",
                end.entry, self.now_playing
            );
            return Vec::new();
        }

        self.queue.remove(end.entry);
        self.now_playing = None;
        self.state = PlaybackState::Idle;

        if self.queue.is_empty() {
            info!("Queue finished");
            return Vec::new();
        }

        self.play_next().await
    }

    /// Stop the current track; its end notification advances the queue.
    pub async fn skip(&mut self) -> MusicResult<()> {
        if self.state != PlaybackState::Playing {
            return Err(MusicError::NothingPlaying);
        }

        let voice = self.voice.as_mut().ok_or(MusicError::NothingPlaying)?;
        if !voice.is_playing().await {
            return Err(MusicError::NothingPlaying);
        }

        voice.stop().await?;
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    /// Disconnect and forget the queue.
    pub async fn leave(&mut self) -> MusicResult<()> {
        let Some(mut voice) = self.voice.take() else {
            return Err(MusicError::NotConnected);
        };

        let connected = voice.is_connected().await;
        self.queue.clear();
        self.now_playing = None;
        self.state = PlaybackState::Idle;

        if !connected {
            // The link is already gone, but the call must still be released.
            if let Err(err) = voice.disconnect().await {
                debug!("Releasing dropped voice session failed: {}", err);
            }
            return Err(MusicError::NotConnected);
        }

        voice.disconnect().await
    }
}
