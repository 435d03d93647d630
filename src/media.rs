//! Collaborator seams: voice output, media resolution, song persistence.
//!
//! The playback core is a logic layer over these traits; the real audio
//! transport and scraping/download backends live behind them.

use crate::GuildId;
use crate::error::PlaybackError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;

/// Opaque playable handle. Produced by the audio layer, owned by the queue
/// once enqueued, released when playback completes.
pub trait AudioSource: Send + Sync {
    /// Apply a volume in `[0.0, 1.0]` to this source. Takes effect
    /// immediately when the source is live.
    fn set_volume(&self, volume: f32);
}

/// Completion signal for one played track.
///
/// The playback worker blocks on the paired wait; the audio transport fires
/// this handle when the track finishes or is stopped. One handle per track,
/// never reused: a track signaled more than once must not carry over into
/// the next track's wait.
#[derive(Clone)]
pub struct TrackDone(Arc<Notify>);

impl TrackDone {
    pub(crate) fn new(notify: Arc<Notify>) -> Self {
        Self(notify)
    }

    /// Fire the signal. Safe to call from any task or thread.
    pub fn signal(&self) {
        self.0.notify_one();
    }
}

/// External audio output endpoint for one guild's voice connection.
#[async_trait]
pub trait VoiceSink: Send + Sync {
    /// Start playing a source. `done` must be signaled when the audio
    /// finishes or is stopped.
    fn play(&self, source: Arc<dyn AudioSource>, done: TrackDone) -> Result<(), PlaybackError>;

    fn pause(&self);

    fn resume(&self);

    /// Stop the current track. The sink signals the pending [`TrackDone`],
    /// which advances the queue — this is how skip works.
    fn stop(&self);

    fn is_connected(&self) -> bool;

    fn is_playing(&self) -> bool;

    fn is_paused(&self) -> bool;

    async fn disconnect(&self);
}

/// Voice-connection management for the chat platform.
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Sink for the guild's current voice connection, joining the
    /// requester's voice channel if the bot is not connected yet. Fails with
    /// [`PlaybackError::VoiceUnavailable`] when the requester is not in a
    /// voice channel either.
    async fn connect(&self, guild_id: &GuildId, author_id: &str)
    -> Result<Arc<dyn VoiceSink>, PlaybackError>;

    /// Sink for an existing connection only; `None` when not connected.
    async fn current(&self, guild_id: &GuildId) -> Option<Arc<dyn VoiceSink>>;

    /// Open a playable source for a downloaded local file.
    fn open_source(&self, local_path: &Path) -> Result<Arc<dyn AudioSource>, PlaybackError>;
}

/// One search hit from the video backend.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VideoHit {
    pub url: String,
    pub title: String,
}

/// A resolved, locally available track.
#[derive(Debug, Clone)]
pub struct DownloadedTrack {
    pub local_path: PathBuf,
    pub title: String,
    pub thumbnail_url: String,
}

/// Video search/download backend.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<VideoHit>>;

    async fn download(&self, url: &str) -> Result<DownloadedTrack, PlaybackError>;
}

/// One persisted song record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredSong {
    pub title: String,
    pub local_path: PathBuf,
    pub thumbnail_url: String,
    pub source_url: String,
}

/// Opaque persistent store for song metadata. This core treats it as a
/// lookup/insert service; its schema is not ours.
#[async_trait]
pub trait SongStore: Send + Sync {
    async fn record(&self, song: &StoredSong) -> anyhow::Result<()>;

    /// Previously downloaded songs, in insertion order.
    async fn list(&self) -> anyhow::Result<Vec<StoredSong>>;
}

/// Voice gateway for transports without voice support (the console REPL).
/// Every connection attempt reports voice as unavailable.
pub struct NoVoiceGateway;

#[async_trait]
impl VoiceGateway for NoVoiceGateway {
    async fn connect(
        &self,
        guild_id: &GuildId,
        _author_id: &str,
    ) -> Result<Arc<dyn VoiceSink>, PlaybackError> {
        Err(PlaybackError::VoiceUnavailable {
            guild_id: guild_id.to_string(),
        })
    }

    async fn current(&self, _guild_id: &GuildId) -> Option<Arc<dyn VoiceSink>> {
        None
    }

    fn open_source(&self, _local_path: &Path) -> Result<Arc<dyn AudioSource>, PlaybackError> {
        Err(PlaybackError::SourceUnavailable(
            "no audio backend configured".into(),
        ))
    }
}

/// Resolver that never finds anything; stands in for the scraping backend
/// when running without one.
pub struct NoMediaResolver;

#[async_trait]
impl MediaResolver for NoMediaResolver {
    async fn search(&self, _query: &str) -> anyhow::Result<Vec<VideoHit>> {
        Ok(Vec::new())
    }

    async fn download(&self, url: &str) -> Result<DownloadedTrack, PlaybackError> {
        Err(PlaybackError::SourceUnavailable(format!(
            "no media backend configured for {url}"
        )))
    }
}

/// In-memory song store used for wiring and tests.
#[derive(Default)]
pub struct MemorySongStore {
    songs: tokio::sync::Mutex<Vec<StoredSong>>,
}

#[async_trait]
impl SongStore for MemorySongStore {
    async fn record(&self, song: &StoredSong) -> anyhow::Result<()> {
        let mut songs = self.songs.lock().await;
        if !songs.iter().any(|existing| existing.title == song.title) {
            songs.push(song.clone());
        }
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<StoredSong>> {
        Ok(self.songs.lock().await.clone())
    }
}
