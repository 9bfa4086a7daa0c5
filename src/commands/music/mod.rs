//! Music commands and the machinery behind them.

pub mod leave;
pub mod play;
pub mod queue;
pub mod skip;

pub mod audio_sources;
pub mod utils;

use crate::{Context, Error};
use poise::CreateReply;
use utils::{
    music_manager::MusicError,
    session::{MusicSession, SessionHandle},
    voice::{SongbirdConnector, get_songbird},
};

/// Get this guild's music session, starting one if needed
pub(crate) async fn session_for(ctx: Context<'_>) -> Result<SessionHandle, Error> {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
    let data = ctx.data();

    if let Some(session) = data.sessions.get(guild_id) {
        return Ok(session);
    }

    let manager = get_songbird(ctx.serenity_context()).await?;
    let session = data.sessions.get_or_spawn(guild_id, || {
        MusicSession::spawn(
            data.cache.clone(),
            data.extractor.clone(),
            Box::new(SongbirdConnector::new(manager, guild_id, data.stream_options)),
        )
    });

    Ok(session)
}

/// Plain text reply, the way every music command answers
pub(crate) fn text(content: impl Into<String>) -> CreateReply {
    CreateReply::default().content(content)
}
