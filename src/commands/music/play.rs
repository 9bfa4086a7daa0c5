use std::sync::Arc;

use super::{
    audio_sources::validate_source_url,
    session_for, text,
    utils::{
        embedded_messages::{self, ChannelAnnouncer},
        voice::get_user_voice_channel,
    },
};
use crate::{CommandResult, Context};
use poise::CreateReply;
use tracing::{info, warn};

/// Discord rejects messages with more embeds than this.
const MAX_EMBEDS_PER_MESSAGE: usize = 10;

/// Play a song from a YouTube URL
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "YouTube video URL"] url: String,
) -> CommandResult {
    info!("Received play command with url: {}", url);

    let url = match validate_source_url(&url) {
        Ok(url) => url,
        Err(err) => {
            ctx.send(embedded_messages::error_reply(&err)).await?;
            return Ok(());
        }
    };

    // Extraction and joining can take a while
    ctx.defer().await?;

    let voice_channel = ctx.guild_id().and_then(|guild_id| {
        get_user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id).ok()
    });

    let session = session_for(ctx).await?;
    let announcer = Arc::new(ChannelAnnouncer::new(
        ctx.serenity_context().http.clone(),
        ctx.channel_id(),
    ));

    match session.play(url.as_str(), voice_channel, announcer).await {
        Ok(notices) if notices.is_empty() => {
            ctx.send(text("Nothing to play.")).await?;
        }
        Ok(notices) => {
            for chunk in notices.chunks(MAX_EMBEDS_PER_MESSAGE) {
                let reply = chunk.iter().fold(CreateReply::default(), |reply, notice| {
                    reply.embed(embedded_messages::notice_embed(notice))
                });
                ctx.send(reply).await?;
            }
        }
        Err(err) => {
            warn!("Play request failed: {}", err);
            ctx.send(embedded_messages::error_reply(&err)).await?;
        }
    }

    Ok(())
}
