//! Per-guild audio playback: bounded queues, worker lifecycle, registry.

pub mod queue;
pub mod registry;

pub use queue::{PlayerQueue, QueueState, Song, SongMeta};
pub use registry::PlayerRegistry;
