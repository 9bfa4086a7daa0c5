//! The voice capability the playback controller needs, and its songbird implementation.

use poise::serenity_prelude as serenity;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serenity::async_trait;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::HttpRequest;
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Call, Event, Songbird, TrackEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::event_handlers::TrackEndNotifier;
use super::music_manager::{MusicError, MusicResult};
use super::queue_manager::EntryId;

/// Completion notice for one started entry, delivered to the owning session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEnd {
    pub entry: EntryId,
    pub error: Option<String>,
}

pub type TrackEndSender = mpsc::UnboundedSender<TrackEnd>;

/// What to stream for an entry
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub entry: EntryId,
    pub stream_url: String,
    pub http_headers: HashMap<String, String>,
}

/// HTTP tuning for media streams.
///
/// Reconnect on drop is songbird's: `HttpRequest` resumes a broken stream with a
/// ranged request from the last byte read. These options only bound how long
/// each of those (re)connects may take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamOptions {
    /// Connect timeout for every request to the media host
    pub connect_timeout: Duration,
    /// TCP keepalive interval, so a silently dead link is noticed and resumed
    pub tcp_keepalive: Duration,
}

impl StreamOptions {
    /// Both bounds set from the configured maximum reconnect delay
    pub fn with_reconnect_delay_max(delay: Duration) -> Self {
        Self {
            connect_timeout: delay,
            tcp_keepalive: delay,
        }
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::with_reconnect_delay_max(Duration::from_secs(5))
    }
}

/// Opens voice sessions for one guild.
#[async_trait]
pub trait VoiceConnector: Send + Sync {
    async fn join(&self, channel: ChannelId) -> MusicResult<Box<dyn VoiceSession>>;
}

/// A live audio connection to a voice channel.
#[async_trait]
pub trait VoiceSession: Send + Sync {
    /// Start streaming; `on_end` receives exactly the entry's completion.
    async fn play(&mut self, request: StreamRequest, on_end: TrackEndSender) -> MusicResult<()>;
    async fn stop(&mut self) -> MusicResult<()>;
    async fn disconnect(&mut self) -> MusicResult<()>;
    async fn is_playing(&self) -> bool;
    async fn is_connected(&self) -> bool;
}

/// Get the Songbird voice client from the context
pub async fn get_songbird(ctx: &Context) -> MusicResult<Arc<Songbird>> {
    songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)
}

/// Get the voice channel ID that the user is currently in
pub fn get_user_voice_channel(
    ctx: &Context,
    guild_id: GuildId,
    user_id: UserId,
) -> MusicResult<ChannelId> {
    let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(MusicError::UserNotInVoiceChannel)
}

/// Converts yt-dlp's header map, dropping anything that is not a valid header.
pub fn header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!("Dropping invalid stream header {}", name),
        }
    }
    map
}

pub struct SongbirdConnector {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    http_client: reqwest::Client,
}

impl SongbirdConnector {
    pub fn new(manager: Arc<Songbird>, guild_id: GuildId, options: StreamOptions) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .tcp_keepalive(options.tcp_keepalive)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            manager,
            guild_id,
            http_client,
        }
    }
}

#[async_trait]
impl VoiceConnector for SongbirdConnector {
    async fn join(&self, channel: ChannelId) -> MusicResult<Box<dyn VoiceSession>> {
        let call = self
            .manager
            .join(self.guild_id, channel)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;

        info!("Joined voice channel {} in guild {}", channel, self.guild_id);

        Ok(Box::new(SongbirdSession {
            manager: self.manager.clone(),
            guild_id: self.guild_id,
            call,
            http_client: self.http_client.clone(),
            current: None,
        }))
    }
}

pub struct SongbirdSession {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<SerenityMutex<Call>>,
    http_client: reqwest::Client,
    current: Option<TrackHandle>,
}

#[async_trait]
impl VoiceSession for SongbirdSession {
    async fn play(&mut self, request: StreamRequest, on_end: TrackEndSender) -> MusicResult<()> {
        let input = HttpRequest::new_with_headers(
            self.http_client.clone(),
            request.stream_url.clone(),
            header_map(&request.http_headers),
        );

        let handle = {
            let mut call = self.call.lock().await;
            call.stop();
            call.play_input(input.into())
        };
        debug!("Track handle created for {}", request.entry);

        for event in [TrackEvent::End, TrackEvent::Error] {
            let notifier = TrackEndNotifier {
                entry: request.entry,
                sender: on_end.clone(),
            };
            if let Err(e) = handle.add_event(Event::Track(event), notifier) {
                let _ = handle.stop();
                return Err(MusicError::PlaybackStartError(e.to_string()));
            }
        }

        self.current = Some(handle);
        Ok(())
    }

    async fn stop(&mut self) -> MusicResult<()> {
        match self.current.take() {
            Some(handle) => handle
                .stop()
                .map_err(|e| MusicError::PlaybackStartError(e.to_string())),
            None => Err(MusicError::NothingPlaying),
        }
    }

    async fn disconnect(&mut self) -> MusicResult<()> {
        self.current = None;
        self.manager
            .remove(self.guild_id)
            .await
            .map_err(|e| MusicError::PlatformError(format!("Failed to leave voice channel: {}", e)))
    }

    async fn is_playing(&self) -> bool {
        match &self.current {
            Some(handle) => handle
                .get_info()
                .await
                .is_ok_and(|info| matches!(info.playing, PlayMode::Play)),
            None => false,
        }
    }

    async fn is_connected(&self) -> bool {
        self.call.lock().await.current_connection().is_some()
    }
}
