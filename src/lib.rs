//! tunebot: a Discord bot that queues and plays audio from YouTube links,
//! with a couple of channel moderation commands on the side.

pub mod commands;
pub mod config;

use std::sync::Arc;

use commands::music::audio_sources::{MetadataExtractor, youtube::YoutubeApi};
use commands::music::utils::{
    session::SessionRegistry, track_cache::TrackCache, voice::StreamOptions,
};
use config::Config;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    /// Per-guild music sessions
    pub sessions: SessionRegistry,
    /// Metadata cache shared by every session
    pub cache: Arc<TrackCache>,
    pub extractor: Arc<dyn MetadataExtractor>,
    pub stream_options: StreamOptions,
}

impl Data {
    pub fn new(config: &Config) -> Self {
        Self {
            sessions: SessionRegistry::default(),
            cache: Arc::new(TrackCache::new(config.cache_capacity, config.cache_ttl)),
            extractor: Arc::new(YoutubeApi::new(config.ytdlp_path.clone())),
            stream_options: StreamOptions::with_reconnect_delay_max(config.reconnect_delay_max),
        }
    }
}

/// Show help for all commands or a specific one
#[poise::command(slash_command, prefix_command, category = "General")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_reconnect_delay_bounds_stream_connects() {
        let config = Config::from_lookup(|name| match name {
            "DISCORD_TOKEN" => Some("abc".to_string()),
            "STREAM_RECONNECT_DELAY_MAX" => Some("2s".to_string()),
            _ => None,
        })
        .unwrap();

        let data = Data::new(&config);

        assert_eq!(data.stream_options.connect_timeout, Duration::from_secs(2));
        assert_eq!(data.stream_options.tcp_keepalive, Duration::from_secs(2));
    }
}
