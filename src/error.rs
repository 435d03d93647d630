//! Top-level error types for Eribot.

use std::sync::Arc;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lexicon(#[from] LexiconError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Lexicon loading errors. Always fatal: the process must not serve
/// messages without a usable lexicon.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("failed to read lexicon file {path}: {source}")]
    Load {
        path: String,
        source: Arc<std::io::Error>,
    },

    #[error("failed to parse lexicon file {path}: {source}")]
    Parse {
        path: String,
        source: Box<toml::de::Error>,
    },

    #[error("lexicon entry {index} in {path}: {reason}")]
    InvalidEntry {
        path: String,
        index: usize,
        reason: String,
    },

    #[error("lexicon is empty after loading all sources")]
    Empty,
}

/// Playback queue and voice-connection errors. All recoverable: they end the
/// affected request or queue, never the process.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("no active voice connection for guild {guild_id}")]
    VoiceUnavailable { guild_id: String },

    #[error("playback queue for guild {guild_id} is full ({capacity} songs)")]
    QueueFull { guild_id: String, capacity: usize },

    #[error("no playable audio source: {0}")]
    SourceUnavailable(String),

    #[error("playback queue for guild {guild_id} is destroyed")]
    Destroyed { guild_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
