use super::{session_for, text, utils::music_manager::MusicError};
use crate::{CommandResult, Context};

/// Skip the current song
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let session = session_for(ctx).await?;

    let reply = match session.skip().await {
        Ok(()) => "Skipped the current song.".to_string(),
        Err(MusicError::NothingPlaying) => "No song is currently playing.".to_string(),
        Err(err) => format!("Could not skip: {}", err),
    };

    ctx.send(text(reply)).await?;

    Ok(())
}
