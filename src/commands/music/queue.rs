use super::{session_for, utils::embedded_messages};
use crate::{CommandResult, Context};

/// Show the current queue
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let entries = session_for(ctx).await?.queue().await?;

    ctx.send(embedded_messages::music_queue(&entries)).await?;

    Ok(())
}
