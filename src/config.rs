//! Configuration loading and validation.

use crate::error::Result;
use anyhow::Context as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Eribot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory path (lexicon files live here by default).
    pub data_dir: PathBuf,

    /// Wake word the bot answers to (locale-specific pattern data, not a
    /// hardcoded literal).
    pub wake_word: String,

    /// Lexicon files, loaded in order into one lexicon.
    pub lexicon_paths: Vec<PathBuf>,

    /// Classifier policy.
    pub classify: ClassifyConfig,

    /// Playback queue behavior.
    pub playback: PlaybackConfig,
}

/// Classifier policy configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyConfig {
    /// Maximum edit distance before input is treated as not understood.
    /// `None` preserves the always-returns-nearest behavior.
    pub max_distance: Option<usize>,

    /// Delay between help messages, to respect platform rate limits.
    pub help_pacing: HelpPacing,
}

/// Pacing delay for help output.
#[derive(Debug, Clone, Copy)]
pub struct HelpPacing(pub Duration);

impl Default for HelpPacing {
    fn default() -> Self {
        Self(Duration::from_millis(1000))
    }
}

/// Playback queue configuration.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackConfig {
    /// How long an empty queue waits for a song before tearing itself down.
    pub idle_timeout: Duration,

    /// Maximum pending songs per guild.
    pub queue_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(180),
            queue_capacity: 50,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let data_dir = std::env::var("ERIBOT_DATA_DIR")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::data_dir().map(|d| d.join("eribot")))
            .unwrap_or_else(|| PathBuf::from("./data"));

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

        let wake_word =
            std::env::var("ERIBOT_WAKE_WORD").unwrap_or_else(|_| "eri".into());

        let lexicon_paths = match std::env::var("ERIBOT_LEXICON") {
            Ok(list) => list.split(':').map(PathBuf::from).collect(),
            Err(_) => vec![
                data_dir.join("intentions.toml"),
                data_dir.join("dialogs.toml"),
            ],
        };

        let max_distance = std::env::var("ERIBOT_MAX_DISTANCE")
            .ok()
            .map(|raw| {
                raw.parse::<usize>()
                    .with_context(|| format!("invalid ERIBOT_MAX_DISTANCE: {raw}"))
            })
            .transpose()?;

        let classify = ClassifyConfig {
            max_distance,
            ..ClassifyConfig::default()
        };

        Ok(Self {
            data_dir,
            wake_word,
            lexicon_paths,
            classify,
            playback: PlaybackConfig::default(),
        })
    }

    /// Load from a specific config file path.
    ///
    /// Environment variables still apply; the path only overrides where the
    /// lexicon files are read from.
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let mut config = Self::load()?;
        config.lexicon_paths = vec![
            path.join("intentions.toml"),
            path.join("dialogs.toml"),
        ];
        Ok(config)
    }
}
