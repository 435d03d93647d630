//! Conversation core: lexicon, classification, context, dispatch.

pub mod context;
pub mod dispatch;
pub mod lexicon;
pub mod registry;

pub use context::ContextStore;
pub use dispatch::Dispatcher;
pub use lexicon::{Lexicon, Payload};
pub use registry::IntentRegistry;
