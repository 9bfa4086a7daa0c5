use super::{session_for, text, utils::music_manager::MusicError};
use crate::{CommandResult, Context};
use tracing::warn;

/// Leave the voice channel and clear the queue
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn leave(ctx: Context<'_>) -> CommandResult {
    let session = session_for(ctx).await?;

    let reply = match session.leave().await {
        Ok(()) => "Left the voice channel and cleared the queue.".to_string(),
        Err(MusicError::NotConnected) => "I'm not in a voice channel.".to_string(),
        Err(err) => {
            warn!("Leave failed: {}", err);
            format!("Cleared the queue, but leaving failed: {}", err)
        }
    };

    ctx.send(text(reply)).await?;

    Ok(())
}
