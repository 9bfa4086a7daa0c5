//! Per-guild music session: an actor task that owns a `PlaybackController` and
//! processes commands and track completions one at a time.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::commands::music::audio_sources::MetadataExtractor;

use super::music_manager::{MusicError, MusicResult, Notice, PlaybackController, PlaybackState};
use super::queue_manager::QueueEntry;
use super::track_cache::TrackCache;
use super::voice::{TrackEnd, VoiceConnector};

const MAILBOX_SIZE: usize = 32;

/// Delivers notices that are not a reply to a command (e.g. the next song starting).
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, notice: Notice);
}

pub enum SessionCommand {
    Play {
        url: String,
        voice_channel: Option<ChannelId>,
        announcer: Arc<dyn Announcer>,
        reply: oneshot::Sender<MusicResult<Vec<Notice>>>,
    },
    Skip {
        reply: oneshot::Sender<MusicResult<()>>,
    },
    Leave {
        reply: oneshot::Sender<MusicResult<()>>,
    },
    Queue {
        reply: oneshot::Sender<Vec<QueueEntry>>,
    },
    State {
        reply: oneshot::Sender<PlaybackState>,
    },
}

pub struct MusicSession {
    controller: PlaybackController,
    commands: mpsc::Receiver<SessionCommand>,
    track_ends: mpsc::UnboundedReceiver<TrackEnd>,
    announcer: Option<Arc<dyn Announcer>>,
}

impl MusicSession {
    /// Spawn the session task and return a handle to it.
    pub fn spawn(
        cache: Arc<TrackCache>,
        extractor: Arc<dyn MetadataExtractor>,
        connector: Box<dyn VoiceConnector>,
    ) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(MAILBOX_SIZE);
        let (end_tx, end_rx) = mpsc::unbounded_channel();

        let session = MusicSession {
            controller: PlaybackController::new(cache, extractor, connector, end_tx),
            commands: command_rx,
            track_ends: end_rx,
            announcer: None,
        };

        tokio::spawn(session.run());

        SessionHandle { sender: command_tx }
    }

    async fn run(mut self) {
        debug!("Music session started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(end) = self.track_ends.recv() => {
                    let notices = self.controller.handle_track_end(end).await;
                    self.announce(notices).await;
                }
            }
        }
        info!("Music session stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Play {
                url,
                voice_channel,
                announcer,
                reply,
            } => {
                self.announcer = Some(announcer);
                let result = match self.controller.connect(voice_channel).await {
                    Ok(()) => self.controller.enqueue(&url).await,
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
            }
            SessionCommand::Skip { reply } => {
                let _ = reply.send(self.controller.skip().await);
            }
            SessionCommand::Leave { reply } => {
                let _ = reply.send(self.controller.leave().await);
            }
            SessionCommand::Queue { reply } => {
                let _ = reply.send(self.controller.queue().snapshot());
            }
            SessionCommand::State { reply } => {
                let _ = reply.send(self.controller.state());
            }
        }
    }

    async fn announce(&self, notices: Vec<Notice>) {
        let Some(announcer) = &self.announcer else {
            return;
        };
        for notice in notices {
            announcer.announce(notice).await;
        }
    }
}

/// Cheap, cloneable handle used by command handlers to talk to a session.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> MusicResult<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| MusicError::SessionClosed)?;
        response.await.map_err(|_| MusicError::SessionClosed)
    }

    /// Connect if needed, enqueue `url`, and start it if nothing is playing.
    pub async fn play(
        &self,
        url: impl Into<String>,
        voice_channel: Option<ChannelId>,
        announcer: Arc<dyn Announcer>,
    ) -> MusicResult<Vec<Notice>> {
        let url = url.into();
        self.request(|reply| SessionCommand::Play {
            url,
            voice_channel,
            announcer,
            reply,
        })
        .await?
    }

    pub async fn skip(&self) -> MusicResult<()> {
        self.request(|reply| SessionCommand::Skip { reply }).await?
    }

    pub async fn leave(&self) -> MusicResult<()> {
        self.request(|reply| SessionCommand::Leave { reply }).await?
    }

    pub async fn queue(&self) -> MusicResult<Vec<QueueEntry>> {
        self.request(|reply| SessionCommand::Queue { reply }).await
    }

    pub async fn state(&self) -> MusicResult<PlaybackState> {
        self.request(|reply| SessionCommand::State { reply }).await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Map of guild ID to its music session
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<GuildId, SessionHandle>,
}

impl SessionRegistry {
    pub fn get(&self, guild_id: GuildId) -> Option<SessionHandle> {
        self.sessions
            .get(&guild_id)
            .map(|handle| handle.value().clone())
            .filter(|handle| !handle.is_closed())
    }

    /// Return the guild's session, spawning it with `spawn` if there is none (or it died).
    pub fn get_or_spawn<F>(&self, guild_id: GuildId, spawn: F) -> SessionHandle
    where
        F: FnOnce() -> SessionHandle,
    {
        match self.sessions.entry(guild_id) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_closed() {
                    info!("Restarting music session for guild {}", guild_id);
                    occupied.insert(spawn());
                }
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => {
                info!("Creating music session for guild {}", guild_id);
                vacant.insert(spawn()).value().clone()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
