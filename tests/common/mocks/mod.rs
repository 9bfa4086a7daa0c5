//! Test doubles for the extractor, the voice layer and announcements

use async_trait::async_trait;
use mockall::mock;
use serenity::model::id::ChannelId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tunebot::commands::music::audio_sources::{MetadataExtractor, TrackMetadata};
use tunebot::commands::music::utils::{
    music_manager::{MusicError, MusicResult, Notice},
    queue_manager::EntryId,
    session::Announcer,
    voice::{StreamRequest, TrackEnd, TrackEndSender, VoiceConnector, VoiceSession},
};

use super::fixtures;

mock! {
    pub Extractor {}

    #[async_trait]
    impl MetadataExtractor for Extractor {
        async fn extract(&self, url: &str) -> MusicResult<TrackMetadata>;
    }
}

/// Extractor that succeeds for every URL except `failing`
pub fn extractor_failing_on(failing: &'static [&'static str]) -> MockExtractor {
    let mut extractor = MockExtractor::new();
    extractor.expect_extract().returning(move |url| {
        if failing.iter().any(|failing_url| *failing_url == url) {
            Err(MusicError::ExtractionError(format!("Video unavailable: {}", url)))
        } else {
            Ok(fixtures::track(url))
        }
    });
    extractor
}

#[derive(Default)]
struct VoiceLog {
    joins: Vec<ChannelId>,
    plays: Vec<StreamRequest>,
    stops: usize,
    disconnects: usize,
}

/// In-memory voice layer.
///
/// Clones share state, so a test keeps one while the controller owns the connector.
#[derive(Clone, Default)]
pub struct FakeVoice {
    log: Arc<Mutex<VoiceLog>>,
    failing_streams: Arc<Mutex<HashSet<String>>>,
    current: Arc<Mutex<Option<(EntryId, TrackEndSender)>>>,
    link_lost: Arc<Mutex<bool>>,
    join_error: Option<MusicError>,
}

impl FakeVoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_join(err: MusicError) -> Self {
        Self {
            join_error: Some(err),
            ..Self::default()
        }
    }

    /// Make `play` fail for the track resolved from `url`
    pub fn fail_stream_of(&self, url: &str) {
        self.failing_streams
            .lock()
            .unwrap()
            .insert(fixtures::stream_url_for(url));
    }

    pub fn connector(&self) -> Box<dyn VoiceConnector> {
        Box::new(self.clone())
    }

    pub fn joins(&self) -> Vec<ChannelId> {
        self.log.lock().unwrap().joins.clone()
    }

    /// Stream URLs handed to `play`, in order
    pub fn played(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .plays
            .iter()
            .map(|request| request.stream_url.clone())
            .collect()
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }

    pub fn disconnects(&self) -> usize {
        self.log.lock().unwrap().disconnects
    }

    pub fn current_entry(&self) -> Option<EntryId> {
        self.current.lock().unwrap().as_ref().map(|(entry, _)| *entry)
    }

    /// Drop the voice link without the bot asking to leave
    pub fn lose_link(&self) {
        *self.link_lost.lock().unwrap() = true;
    }

    /// Let the current track run to its end, as the voice driver would report it
    pub fn finish_current(&self) -> Option<TrackEnd> {
        let (entry, sender) = self.current.lock().unwrap().take()?;
        let end = TrackEnd { entry, error: None };
        let _ = sender.send(end.clone());
        Some(end)
    }
}

#[async_trait]
impl VoiceConnector for FakeVoice {
    async fn join(&self, channel: ChannelId) -> MusicResult<Box<dyn VoiceSession>> {
        if let Some(err) = &self.join_error {
            return Err(err.clone());
        }
        self.log.lock().unwrap().joins.push(channel);
        Ok(Box::new(FakeSession {
            voice: self.clone(),
            connected: true,
        }))
    }
}

struct FakeSession {
    voice: FakeVoice,
    connected: bool,
}

#[async_trait]
impl VoiceSession for FakeSession {
    async fn play(&mut self, request: StreamRequest, on_end: TrackEndSender) -> MusicResult<()> {
        if self
            .voice
            .failing_streams
            .lock()
            .unwrap()
            .contains(&request.stream_url)
        {
            return Err(MusicError::PlaybackStartError(format!(
                "403 Forbidden: {}",
                request.stream_url
            )));
        }

        *self.voice.current.lock().unwrap() = Some((request.entry, on_end));
        self.voice.log.lock().unwrap().plays.push(request);
        Ok(())
    }

    async fn stop(&mut self) -> MusicResult<()> {
        let current = self.voice.current.lock().unwrap().take();
        match current {
            Some((entry, sender)) => {
                self.voice.log.lock().unwrap().stops += 1;
                let _ = sender.send(TrackEnd { entry, error: None });
                Ok(())
            }
            None => Err(MusicError::NothingPlaying),
        }
    }

    async fn disconnect(&mut self) -> MusicResult<()> {
        self.connected = false;
        self.voice.current.lock().unwrap().take();
        self.voice.log.lock().unwrap().disconnects += 1;
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        self.voice.current.lock().unwrap().is_some()
    }

    async fn is_connected(&self) -> bool {
        self.connected && !*self.voice.link_lost.lock().unwrap()
    }
}

/// Forwards every announcement to a channel the test can await
pub struct RecordingAnnouncer {
    sender: mpsc::UnboundedSender<Notice>,
}

impl RecordingAnnouncer {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn announce(&self, notice: Notice) {
        let _ = self.sender.send(notice);
    }
}
