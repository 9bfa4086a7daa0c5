use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{GetMessages, MessageId, Timestamp};
use tracing::{debug, info};

use super::AdminError;
use crate::{CommandResult, Context};

/// Most messages Discord lets a bot fetch or bulk-delete at once.
const MAX_PURGE: i64 = 100;

/// Discord's bulk-delete endpoint rejects the whole batch if any message is older than this.
const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;

/// Checks a requested purge amount, returning it as a fetch limit.
pub fn validate_purge_amount(amount: i64) -> Result<u8, AdminError> {
    if (1..=MAX_PURGE).contains(&amount) {
        Ok(amount as u8)
    } else {
        Err(AdminError::InvalidPurgeAmount(amount))
    }
}

/// Splits message ids into those that can be bulk-deleted and those that must
/// be deleted one at a time, relative to `now`.
pub fn split_by_age(ids: &[MessageId], now: Timestamp) -> (Vec<MessageId>, Vec<MessageId>) {
    let cutoff = now.unix_timestamp() - BULK_DELETE_MAX_AGE_SECS;
    ids.iter()
        .copied()
        .partition(|id| id.created_at().unix_timestamp() > cutoff)
}

/// Deletes input amount of messages in the channel
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES",
    required_bot_permissions = "MANAGE_MESSAGES",
    category = "Admin"
)]
pub async fn purge(
    ctx: Context<'_>,
    #[description = "Number of messages to delete (1-100)"] amount: i64,
) -> CommandResult {
    let limit = match validate_purge_amount(amount) {
        Ok(limit) => limit,
        Err(err) => {
            ctx.send(CreateReply::default().content(err.to_string()).ephemeral(true))
                .await?;
            return Ok(());
        }
    };

    ctx.defer_ephemeral().await?;

    let channel_id = ctx.channel_id();
    let ids: Vec<MessageId> = channel_id
        .messages(ctx.http(), GetMessages::new().limit(limit))
        .await?
        .iter()
        .map(|message| message.id)
        .collect();

    let (recent, old) = split_by_age(&ids, Timestamp::now());
    debug!("Purging {} recent and {} old messages", recent.len(), old.len());

    if !recent.is_empty() {
        channel_id.delete_messages(ctx.http(), recent.iter().copied()).await?;
    }
    for id in &old {
        channel_id.delete_message(ctx.http(), *id).await?;
    }
    info!("Purged {} messages from channel {}", ids.len(), channel_id);

    ctx.send(
        CreateReply::default()
            .content(format!("Deleted {} messages.", ids.len()))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;
    const NOW: i64 = 1_760_000_000;
    const DAY: i64 = 24 * 60 * 60;

    /// A message id minted `age_secs` before `NOW`
    fn id_aged(age_secs: i64) -> MessageId {
        let millis = (NOW - age_secs) * 1000 - DISCORD_EPOCH_MS;
        MessageId::new(((millis as u64) << 22) | 1)
    }

    fn now() -> Timestamp {
        Timestamp::from_unix_timestamp(NOW).unwrap()
    }

    #[test_case(1, 1)]
    #[test_case(42, 42)]
    #[test_case(100, 100)]
    fn test_accepts_amounts_in_range(amount: i64, limit: u8) {
        assert_eq!(validate_purge_amount(amount), Ok(limit));
    }

    #[test_case(0)]
    #[test_case(-5)]
    #[test_case(101)]
    fn test_rejects_amounts_out_of_range(amount: i64) {
        assert_matches!(
            validate_purge_amount(amount),
            Err(AdminError::InvalidPurgeAmount(got)) if got == amount
        );
    }

    #[test_case(&[60, DAY, 13 * DAY], 3, 0 ; "all recent")]
    #[test_case(&[60, 60, 60, 60, 60, 20 * DAY], 5, 1 ; "one older than two weeks")]
    #[test_case(&[15 * DAY, 30 * DAY], 0, 2 ; "all old")]
    #[test_case(&[14 * DAY + 1], 0, 1 ; "just past the cutoff")]
    #[test_case(&[], 0, 0 ; "empty channel")]
    fn test_split_by_age(ages: &[i64], recent: usize, old: usize) {
        let ids: Vec<MessageId> = ages.iter().map(|age| id_aged(*age)).collect();

        let (bulk, single) = split_by_age(&ids, now());

        assert_eq!((bulk.len(), single.len()), (recent, old));
    }

    #[test]
    fn test_split_keeps_ids_in_their_group() {
        let fresh = id_aged(DAY);
        let stale = id_aged(20 * DAY);

        let (bulk, single) = split_by_age(&[stale, fresh], now());

        assert_eq!(bulk, vec![fresh]);
        assert_eq!(single, vec![stale]);
    }
}
