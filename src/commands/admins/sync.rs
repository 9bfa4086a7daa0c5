use futures::future::join_all;
use poise::serenity_prelude as serenity;
use serenity::all::CreateCommand;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

use super::AdminError;
use crate::commands;
use crate::{CommandResult, Context};

/// Where `sync` publishes the command set when no guilds are given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// `~`: the guild-local commands, to the current guild
    CurrentGuild,
    /// `*`: the global commands, copied into the current guild
    CopyGlobal,
    /// `^`: remove all commands from the current guild
    ClearGuild,
}

#[derive(Error, Debug, PartialEq)]
#[error("Unknown sync mode `{0}`, expected one of ~ * ^")]
pub struct UnknownSyncMode(String);

impl FromStr for SyncMode {
    type Err = UnknownSyncMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "~" => Ok(SyncMode::CurrentGuild),
            "*" => Ok(SyncMode::CopyGlobal),
            "^" => Ok(SyncMode::ClearGuild),
            other => Err(UnknownSyncMode(other.to_string())),
        }
    }
}

/// Payload for `set_global_commands` and for copying the global set into a guild
pub fn global_payload() -> Vec<CreateCommand> {
    poise::builtins::create_application_commands(&commands::global())
}

/// Payload for publishing to single guilds. Disjoint from the global set.
pub fn guild_payload() -> Vec<CreateCommand> {
    poise::builtins::create_application_commands(&commands::guild_local())
}

pub fn synced_message(count: usize, mode: Option<SyncMode>) -> String {
    match mode {
        None => format!("Synced {} commands globally", count),
        Some(_) => format!("Synced {} commands to the current guild.", count),
    }
}

pub fn tree_message(synced: usize, total: usize) -> String {
    format!("Synced the tree to {}/{}.", synced, total)
}

/// Re-publish slash commands, globally or per guild
#[poise::command(prefix_command, guild_only, owners_only, hide_in_help, category = "Admin")]
pub async fn sync(
    ctx: Context<'_>,
    #[description = "Guilds to sync the guild commands to"] guilds: Vec<serenity::GuildId>,
    #[description = "~ current guild, * copy global commands here, ^ clear this guild"]
    mode: Option<SyncMode>,
) -> CommandResult {
    if guilds.is_empty() {
        let guild_id = ctx.guild_id().ok_or(AdminError::NotInGuild)?;

        let synced = match mode {
            None => serenity::Command::set_global_commands(ctx.http(), global_payload())
                .await?
                .len(),
            Some(SyncMode::CurrentGuild) => guild_id
                .set_commands(ctx.http(), guild_payload())
                .await?
                .len(),
            Some(SyncMode::CopyGlobal) => guild_id
                .set_commands(ctx.http(), global_payload())
                .await?
                .len(),
            Some(SyncMode::ClearGuild) => {
                guild_id.set_commands(ctx.http(), Vec::new()).await?;
                0
            }
        };

        info!("Synced {} commands ({:?})", synced, mode);
        ctx.say(synced_message(synced, mode)).await?;
        return Ok(());
    }

    let results = join_all(
        guilds
            .iter()
            .map(|guild_id| guild_id.set_commands(ctx.http(), guild_payload())),
    )
    .await;

    let mut synced = 0;
    for (guild_id, result) in guilds.iter().zip(results) {
        match result {
            Ok(_) => synced += 1,
            Err(e) => warn!("Failed to sync commands to guild {}: {}", guild_id, e),
        }
    }

    ctx.say(tree_message(synced, guilds.len())).await?;

    Ok(())
}
