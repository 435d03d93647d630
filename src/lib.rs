//! Eribot: a conversational assistant core pairing a nearest-neighbor intent
//! classifier with per-guild audio playback queues.

pub mod config;
pub mod convo;
pub mod error;
pub mod handlers;
pub mod media;
pub mod messaging;
pub mod playback;
pub mod text;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared collaborators handed to every intention handler.
///
/// Constructed once at startup; the dispatcher clones the `Arc` per turn.
pub struct BotDeps {
    pub chat: Arc<dyn messaging::Chat>,
    pub context: convo::ContextStore,
    pub players: Arc<playback::PlayerRegistry>,
    pub voice: Arc<dyn media::VoiceGateway>,
    pub resolver: Arc<dyn media::MediaResolver>,
    pub songs: Arc<dyn media::SongStore>,
}

/// Conversation channel identifier type.
pub type ChannelId = Arc<str>;

/// Guild (server/community) identifier type.
pub type GuildId = Arc<str>;

/// Inbound message delivered by a chat-platform transport.
///
/// The transport strips the bot's self-mention from `content` before handing
/// the message over; everything else arrives verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub channel_id: ChannelId,
    /// None for direct messages, which have no guild scope.
    pub guild_id: Option<GuildId>,
    pub author_id: String,
    /// Platform mention token for the author (e.g. `<@123>`), used when
    /// announcing who requested a song.
    pub author_mention: String,
    pub content: String,
    pub mentions_bot: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl InboundMessage {
    /// Build a minimal message for wiring and tests.
    pub fn text(
        channel_id: impl Into<ChannelId>,
        author_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let author_id = author_id.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            guild_id: None,
            author_id: author_id.clone(),
            author_mention: author_id,
            content: content.into(),
            mentions_bot: false,
            timestamp: chrono::Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_guild(mut self, guild_id: impl Into<GuildId>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }
}

/// Structured card sent back to a text channel (embed-style on platforms
/// that support it, rendered as plain text elsewhere).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Card {
    pub title: Option<String>,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub fields: Vec<CardField>,
}

/// A labeled field on a [`Card`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardField {
    pub name: String,
    pub value: String,
}

impl Card {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}
