//! Channel moderation and bot administration commands.

pub mod purge;
pub mod sync;

use thiserror::Error;

/// Errors raised by the admin commands
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdminError {
    #[error("This command can only be used in a server")]
    NotInGuild,

    #[error("Purge amount must be between 1 and 100 (got {0})")]
    InvalidPurgeAmount(i64),
}
