//! One guild's playback queue and its worker task.
//!
//! A queue owns a bounded FIFO of pending songs and a single background
//! worker that serializes playback. The worker waits up to the idle timeout
//! for the next song; an empty wait tears the queue down, announcing the
//! departure and disconnecting the voice sink. Playback completion arrives
//! as an explicit [`TrackDone`] signal fired by the audio transport.

use crate::config::PlaybackConfig;
use crate::error::PlaybackError;
use crate::media::{AudioSource, TrackDone, VoiceSink};
use crate::messaging::Chat;
use crate::{Card, ChannelId, GuildId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Song metadata announced when playback starts.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SongMeta {
    pub title: String,
    pub thumbnail_url: String,
    pub source_url: String,
    pub requested_by: String,
}

/// One queued song: an opaque playable source plus its metadata. Owned
/// exclusively by the queue once enqueued; dropped after playback.
pub struct Song {
    pub source: Arc<dyn AudioSource>,
    pub meta: SongMeta,
}

/// Queue lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Worker is playing or about to play.
    Active,
    /// Worker is blocked waiting for the next song, bounded by the idle
    /// timeout.
    IdleWait,
    /// Worker stopped, voice sink released. Terminal.
    Destroyed,
}

struct Inner {
    items: VecDeque<Song>,
    volume: f32,
    state: QueueState,
    now_playing: Option<Arc<dyn AudioSource>>,
    /// Completion signal for the track currently playing. Fresh per track:
    /// a track signaled twice (skip racing natural completion) must not
    /// leave a permit that releases the next track early.
    track_done: Option<Arc<Notify>>,
}

enum Next {
    Song(Song),
    IdleTimeout,
    Destroyed,
}

/// Per-guild playback queue. At most one worker runs per queue; songs play
/// in strict enqueue order.
pub struct PlayerQueue {
    guild_id: GuildId,
    text_channel: ChannelId,
    chat: Arc<dyn Chat>,
    sink: Arc<dyn VoiceSink>,
    inner: Mutex<Inner>,
    arrived: Notify,
    config: PlaybackConfig,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl PlayerQueue {
    fn build(
        guild_id: GuildId,
        text_channel: ChannelId,
        chat: Arc<dyn Chat>,
        sink: Arc<dyn VoiceSink>,
        config: PlaybackConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            guild_id,
            text_channel,
            chat,
            sink,
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                volume: 1.0,
                state: QueueState::IdleWait,
                now_playing: None,
                track_done: None,
            }),
            arrived: Notify::new(),
            config,
            worker: Mutex::new(None),
        })
    }

    /// Create the queue and start its worker task.
    pub fn spawn(
        guild_id: GuildId,
        text_channel: ChannelId,
        chat: Arc<dyn Chat>,
        sink: Arc<dyn VoiceSink>,
        config: PlaybackConfig,
    ) -> Arc<Self> {
        let queue = Self::build(guild_id, text_channel, chat, sink, config);
        let handle = tokio::spawn(Arc::clone(&queue).worker_loop());
        *queue.worker.lock().expect("worker lock poisoned") = Some(handle);
        queue
    }

    /// Enqueue a song without blocking. Rejected when the queue is at
    /// capacity or already destroyed; existing items are untouched either
    /// way.
    pub fn enqueue(&self, song: Song) -> Result<(), PlaybackError> {
        {
            let mut inner = self.inner.lock().expect("queue lock poisoned");
            if inner.state == QueueState::Destroyed {
                return Err(PlaybackError::Destroyed {
                    guild_id: self.guild_id.to_string(),
                });
            }
            if inner.items.len() >= self.config.queue_capacity {
                return Err(PlaybackError::QueueFull {
                    guild_id: self.guild_id.to_string(),
                    capacity: self.config.queue_capacity,
                });
            }
            inner.items.push_back(song);
        }
        self.arrived.notify_one();
        Ok(())
    }

    /// Store the queue volume and apply it to the live source, if any.
    /// Clamped here so the `[0.0, 1.0]` bound holds end-to-end regardless of
    /// caller discipline.
    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        let live = {
            let mut inner = self.inner.lock().expect("queue lock poisoned");
            inner.volume = volume;
            inner.now_playing.clone()
        };
        if let Some(source) = live {
            source.set_volume(volume);
        }
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().expect("queue lock poisoned").volume
    }

    pub fn state(&self) -> QueueState {
        self.inner.lock().expect("queue lock poisoned").state
    }

    /// Whether the queue still accepts work (Active or Idle-wait).
    pub fn is_active(&self) -> bool {
        self.state() != QueueState::Destroyed
    }

    /// Number of songs waiting in the queue (the playing one excluded).
    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue lock poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only snapshot of the next queued songs, in play order.
    pub fn peek_upcoming(&self, limit: usize) -> Vec<SongMeta> {
        let inner = self.inner.lock().expect("queue lock poisoned");
        inner
            .items
            .iter()
            .take(limit)
            .map(|song| song.meta.clone())
            .collect()
    }

    /// Tear the queue down: disconnect the voice sink and stop the worker.
    /// Idempotent and safe under concurrent invocation from other tasks;
    /// the sink is disconnected exactly once.
    pub async fn destroy(&self) {
        let track_done = {
            let mut inner = self.inner.lock().expect("queue lock poisoned");
            if inner.state == QueueState::Destroyed {
                return;
            }
            inner.state = QueueState::Destroyed;
            inner.items.clear();
            inner.now_playing = None;
            inner.track_done.take()
        };

        self.sink.disconnect().await;

        // Wake the worker out of either wait point so it observes the state.
        self.arrived.notify_waiters();
        if let Some(done) = track_done {
            done.notify_one();
        }

        let handle = self.worker.lock().expect("worker lock poisoned").take();
        if let Some(handle) = handle {
            handle.abort();
        }

        tracing::info!(guild_id = %self.guild_id, "playback queue destroyed");
    }

    async fn worker_loop(self: Arc<Self>) {
        tracing::debug!(guild_id = %self.guild_id, "playback worker started");

        loop {
            let song = match self.wait_next().await {
                Next::Song(song) => song,
                Next::Destroyed => break,
                Next::IdleTimeout => {
                    tracing::info!(guild_id = %self.guild_id, "idle timeout, leaving voice");
                    let _ = self
                        .chat
                        .send_text(
                            &self.text_channel,
                            "Nadie está escuchando música, salgo del canal de voz 🥺",
                        )
                        .await;
                    self.destroy().await;
                    break;
                }
            };

            if !self.sink.is_connected() {
                tracing::warn!(guild_id = %self.guild_id, "voice connection lost, tearing down");
                self.destroy().await;
                break;
            }

            if let Err(error) = self.chat.send_card(&self.text_channel, &now_playing_card(&song.meta)).await {
                tracing::warn!(guild_id = %self.guild_id, %error, "failed to announce song");
            }

            let finished = Arc::new(Notify::new());
            let volume = {
                let mut inner = self.inner.lock().expect("queue lock poisoned");
                inner.now_playing = Some(Arc::clone(&song.source));
                inner.track_done = Some(Arc::clone(&finished));
                inner.volume
            };
            song.source.set_volume(volume);

            let done = TrackDone::new(Arc::clone(&finished));
            match self.sink.play(Arc::clone(&song.source), done) {
                Ok(()) => finished.notified().await,
                Err(error) => {
                    tracing::warn!(guild_id = %self.guild_id, %error, title = %song.meta.title, "song has no playable source");
                    let _ = self
                        .chat
                        .send_text(
                            &self.text_channel,
                            &format!("No pude reproducir **{}** 😢", song.meta.title),
                        )
                        .await;
                }
            }

            let destroyed = {
                let mut inner = self.inner.lock().expect("queue lock poisoned");
                inner.now_playing = None;
                inner.track_done = None;
                inner.state == QueueState::Destroyed
            };
            drop(song);
            if destroyed {
                break;
            }
        }

        tracing::debug!(guild_id = %self.guild_id, "playback worker stopped");
    }

    /// Wait up to the idle timeout for the next song. The deadline is fixed
    /// at entry; enqueue wakeups that lose a race to a concurrent pop do not
    /// extend it.
    async fn wait_next(&self) -> Next {
        let deadline = tokio::time::Instant::now() + self.config.idle_timeout;

        loop {
            let notified = self.arrived.notified();
            {
                let mut inner = self.inner.lock().expect("queue lock poisoned");
                match inner.state {
                    QueueState::Destroyed => return Next::Destroyed,
                    _ => {
                        if let Some(song) = inner.items.pop_front() {
                            inner.state = QueueState::Active;
                            return Next::Song(song);
                        }
                        inner.state = QueueState::IdleWait;
                    }
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Next::IdleTimeout;
            }
        }
    }
}

fn now_playing_card(meta: &SongMeta) -> Card {
    Card::new(meta.title.clone())
        .titled("🎧 Ahora suena")
        .thumbnail(meta.thumbnail_url.clone())
        .field("Pedida por", meta.requested_by.clone())
        .field("Enlaces", format!("[YouTube]({})", meta.source_url))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::error::PlaybackError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Audio source double that records the last volume applied to it.
    pub struct FakeSource {
        pub volume: Mutex<f32>,
    }

    impl FakeSource {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                volume: Mutex::new(1.0),
            })
        }
    }

    impl AudioSource for FakeSource {
        fn set_volume(&self, volume: f32) {
            *self.volume.lock().unwrap() = volume;
        }
    }

    /// Voice sink double. `auto_finish` signals track completion as soon as
    /// playback starts; otherwise the test drives [`FakeSink::finish_current`].
    pub struct FakeSink {
        pub connected: AtomicBool,
        pub playing: AtomicBool,
        pub paused: AtomicBool,
        pub disconnects: AtomicUsize,
        pub auto_finish: bool,
        pub fail_play: AtomicBool,
        pub pending: Mutex<Option<TrackDone>>,
    }

    impl FakeSink {
        pub fn new(auto_finish: bool) -> Arc<Self> {
            Arc::new(Self {
                connected: AtomicBool::new(true),
                playing: AtomicBool::new(false),
                paused: AtomicBool::new(false),
                disconnects: AtomicUsize::new(0),
                auto_finish,
                fail_play: AtomicBool::new(false),
                pending: Mutex::new(None),
            })
        }

        pub fn finish_current(&self) {
            self.playing.store(false, Ordering::SeqCst);
            if let Some(done) = self.pending.lock().unwrap().take() {
                done.signal();
            }
        }
    }

    #[async_trait]
    impl VoiceSink for FakeSink {
        fn play(&self, _source: Arc<dyn AudioSource>, done: TrackDone) -> Result<(), PlaybackError> {
            if self.fail_play.load(Ordering::SeqCst) {
                return Err(PlaybackError::SourceUnavailable("fake failure".into()));
            }
            self.playing.store(true, Ordering::SeqCst);
            if self.auto_finish {
                self.playing.store(false, Ordering::SeqCst);
                done.signal();
            } else {
                *self.pending.lock().unwrap() = Some(done);
            }
            Ok(())
        }

        fn pause(&self) {
            self.paused.store(true, Ordering::SeqCst);
        }

        fn resume(&self) {
            self.paused.store(false, Ordering::SeqCst);
        }

        fn stop(&self) {
            self.finish_current();
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::SeqCst)
        }

        fn is_paused(&self) -> bool {
            self.paused.load(Ordering::SeqCst)
        }

        async fn disconnect(&self) {
            self.connected.store(false, Ordering::SeqCst);
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn song(title: &str) -> Song {
        song_with_source(title, FakeSource::new())
    }

    pub fn song_with_source(title: &str, source: Arc<FakeSource>) -> Song {
        Song {
            source,
            meta: SongMeta {
                title: title.to_string(),
                thumbnail_url: "http://example.test/thumb.jpg".into(),
                source_url: "http://www.youtube.com/watch?v=aaaaaaaaaaa".into(),
                requested_by: "@tester".into(),
            },
        }
    }
}
