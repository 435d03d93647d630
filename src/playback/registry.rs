//! Guild-to-queue map.

use crate::config::PlaybackConfig;
use crate::error::PlaybackError;
use crate::media::VoiceSink;
use crate::messaging::Chat;
use crate::playback::queue::{PlayerQueue, SongMeta};
use crate::{ChannelId, GuildId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Tracks at most one [`PlayerQueue`] per guild. A destroyed queue still
/// registered here is treated as absent and replaced on the next lookup.
#[derive(Default)]
pub struct PlayerRegistry {
    players: Mutex<HashMap<GuildId, Arc<PlayerQueue>>>,
    config: PlaybackConfig,
}

impl PlayerRegistry {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            players: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// The guild's live queue, spawning a fresh one bound to `sink` when
    /// there is none (or only a destroyed leftover).
    pub fn get_or_create(
        &self,
        guild_id: &GuildId,
        text_channel: &ChannelId,
        chat: Arc<dyn Chat>,
        sink: Arc<dyn VoiceSink>,
    ) -> Arc<PlayerQueue> {
        let mut players = self.players.lock().expect("registry lock poisoned");
        if let Some(queue) = players.get(guild_id) {
            if queue.is_active() {
                return Arc::clone(queue);
            }
        }
        let queue = PlayerQueue::spawn(
            guild_id.clone(),
            text_channel.clone(),
            chat,
            sink,
            self.config.clone(),
        );
        players.insert(guild_id.clone(), Arc::clone(&queue));
        queue
    }

    /// The guild's queue only if it exists and is still live.
    pub fn get(&self, guild_id: &GuildId) -> Option<Arc<PlayerQueue>> {
        let players = self.players.lock().expect("registry lock poisoned");
        players.get(guild_id).filter(|queue| queue.is_active()).cloned()
    }

    /// Deregister the guild's queue. Does not destroy it; teardown is the
    /// queue's own job.
    pub fn remove(&self, guild_id: &GuildId) {
        self.players
            .lock()
            .expect("registry lock poisoned")
            .remove(guild_id);
    }

    /// Upcoming songs for the guild, or an error when it has no live queue.
    pub fn upcoming(&self, guild_id: &GuildId, limit: usize) -> Result<Vec<SongMeta>, PlaybackError> {
        let queue = self.get(guild_id).ok_or_else(|| PlaybackError::Destroyed {
            guild_id: guild_id.to_string(),
        })?;
        Ok(queue.peek_upcoming(limit))
    }

    /// Set the guild's playback volume, if it has a live queue.
    pub fn set_volume(&self, guild_id: &GuildId, volume: f32) -> Result<(), PlaybackError> {
        let queue = self.get(guild_id).ok_or_else(|| PlaybackError::Destroyed {
            guild_id: guild_id.to_string(),
        })?;
        queue.set_volume(volume);
        Ok(())
    }
}
