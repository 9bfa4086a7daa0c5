use crate::{CommandResult, Context};

/// Say hello!
#[poise::command(slash_command, category = "General")]
pub async fn hello(ctx: Context<'_>) -> CommandResult {
    ctx.say("Hello, world!").await?;

    Ok(())
}
