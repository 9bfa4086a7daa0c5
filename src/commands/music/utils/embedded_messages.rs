use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{CreateEmbed, CreateEmbedFooter, CreateMessage};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;
use tracing::error;

use super::format_duration;
use super::music_manager::{MusicError, Notice};
use super::queue_manager::QueueEntry;
use super::session::Announcer;
use crate::commands::music::audio_sources::TrackMetadata;

const GREEN: u32 = 0x00ff00;
const RED: u32 = 0xff0000;
const BLUE: u32 = 0x3498db;

/// Discord rejects embeds with more fields than this.
pub const MAX_EMBED_FIELDS: usize = 25;

fn describe(metadata: &TrackMetadata) -> (String, String) {
    let link = format!("[{}]({})", metadata.title, metadata.source_url);
    let duration = metadata
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "Unknown duration".to_string());
    (link, duration)
}

/// Create an embed for when a song is now playing
pub fn now_playing(metadata: &TrackMetadata) -> CreateEmbed {
    let (link, duration) = describe(metadata);

    let embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(link)
        .field("Duration", format!("`{}`", duration), true)
        .color(GREEN);

    match &metadata.thumbnail {
        Some(thumbnail) => embed.thumbnail(thumbnail),
        None => embed,
    }
}

/// Create an embed for when a song is added to the queue
pub fn added_to_queue(metadata: &TrackMetadata, position: usize) -> CreateEmbed {
    let (link, duration) = describe(metadata);

    CreateEmbed::new()
        .title("🎵 Added to Queue")
        .description(link)
        .field("Duration", format!("`{}`", duration), true)
        .field("Position", format!("`#{}`", position), true)
        .color(GREEN)
}

/// Create an embed for an error shown to the invoker
pub fn error_embed(err: &MusicError) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Error")
        .description(err.to_string())
        .color(RED)
}

pub fn error_reply(err: &MusicError) -> CreateReply {
    CreateReply::default().embed(error_embed(err))
}

pub fn notice_embed(notice: &Notice) -> CreateEmbed {
    match notice {
        Notice::NowPlaying(metadata) => now_playing(metadata),
        Notice::Queued { metadata, position } => added_to_queue(metadata, *position),
        Notice::Skipped { entry, error } => CreateEmbed::new()
            .title("⚠️ Skipped Track")
            .description(format!("[{}]({})\n{}", entry.title, entry.url, error))
            .color(RED),
        Notice::Halted(err) => error_embed(err),
    }
}

/// One embed field per queued entry: `"1."` / `"[title](url)"`, capped at the embed limit
pub fn queue_fields(entries: &[QueueEntry]) -> Vec<(String, String, bool)> {
    entries
        .iter()
        .take(MAX_EMBED_FIELDS)
        .enumerate()
        .map(|(index, entry)| {
            (
                format!("{}.", index + 1),
                format!("[{}]({})", entry.title, entry.url),
                false,
            )
        })
        .collect()
}

/// Create the reply for the `/queue` command
pub fn music_queue(entries: &[QueueEntry]) -> CreateReply {
    if entries.is_empty() {
        return CreateReply::default().content("The queue is empty.");
    }

    let embed = CreateEmbed::new()
        .title("Music Queue")
        .fields(queue_fields(entries))
        .color(BLUE);

    match queue_overflow(entries.len()) {
        Some(note) => CreateReply::default().embed(embed.footer(CreateEmbedFooter::new(note))),
        None => CreateReply::default().embed(embed),
    }
}

/// Footer for entries that did not fit in the embed
pub fn queue_overflow(total: usize) -> Option<String> {
    total
        .checked_sub(MAX_EMBED_FIELDS)
        .filter(|hidden| *hidden > 0)
        .map(|hidden| format!("...and {} more", hidden))
}

/// Posts notices into the text channel music was last requested from.
pub struct ChannelAnnouncer {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelAnnouncer {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl Announcer for ChannelAnnouncer {
    async fn announce(&self, notice: Notice) {
        let message = CreateMessage::new().embed(notice_embed(&notice));
        if let Err(e) = self.channel_id.send_message(&self.http, message).await {
            error!("Failed to announce in channel {}: {}", self.channel_id, e);
        }
    }
}
