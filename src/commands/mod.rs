//! This module aggregates all the command modules for the bot.

/// Moderation and administration commands (purge, sync).
pub mod admins;
/// General purpose commands (e.g., hello).
pub mod general;
/// Commands related to music playback.
pub mod music;

use crate::{Data, Error};

/// Commands published globally, at startup and by a plain `sync`
pub fn global() -> Vec<poise::Command<Data, Error>> {
    vec![
        crate::help(),
        general::hello::hello(),
        admins::purge::purge(),
        admins::sync::sync(),
        music::play::play(),
        music::skip::skip(),
        music::leave::leave(),
        music::queue::queue(),
    ]
}

/// Commands that are only ever published to single guilds, through `sync ~`
/// or `sync <guilds>`. None yet.
pub fn guild_local() -> Vec<poise::Command<Data, Error>> {
    Vec::new()
}

/// Every command the framework dispatches
pub fn all() -> Vec<poise::Command<Data, Error>> {
    let mut commands = global();
    commands.extend(guild_local());
    commands
}
