use poise::serenity_prelude as serenity;
use serenity::async_trait;
use songbird::tracks::PlayMode;
use tracing::{debug, warn};

use super::queue_manager::EntryId;
use super::voice::{TrackEnd, TrackEndSender};

/// Event handler for when a track ends or errors.
///
/// Runs on songbird's event thread, so it only forwards the completion to the
/// owning session's mailbox.
pub struct TrackEndNotifier {
    pub entry: EntryId,
    pub sender: TrackEndSender,
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(tracks) = ctx {
            let error = tracks.iter().find_map(|(state, _)| match &state.playing {
                PlayMode::Errored(e) => Some(format!("{:?}", e)),
                _ => None,
            });

            debug!("Track {} ended, notifying session", self.entry);
            if self
                .sender
                .send(TrackEnd {
                    entry: self.entry,
                    error,
                })
                .is_err()
            {
                warn!("Session for track {} is gone, dropping end event", self.entry);
            }
        }
        None
    }
}
