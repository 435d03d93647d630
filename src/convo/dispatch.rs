//! Turn pipeline: normalize, classify, dispatch.

use crate::config::ClassifyConfig;
use crate::convo::lexicon::{Lexicon, Payload};
use crate::convo::registry::IntentRegistry;
use crate::text::{ParsedArguments, TextNormalizer};
use crate::{BotDeps, Card, ChannelId, InboundMessage, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Intention id the dispatcher intercepts to emit the help list. Handlers
/// registered under this id are never invoked.
const HELP_INTENTION: &str = "help";

/// Drives one conversation turn per inbound message.
///
/// Turns on the same channel are serialized: a turn holds its channel's lock
/// across classification and handler dispatch, so context reads and writes
/// for one channel never race. Different channels proceed concurrently.
pub struct Dispatcher {
    deps: Arc<BotDeps>,
    lexicon: Lexicon,
    registry: IntentRegistry,
    normalizer: TextNormalizer,
    policy: ClassifyConfig,
    turn_locks: Mutex<HashMap<ChannelId, Arc<tokio::sync::Mutex<()>>>>,
}

impl Dispatcher {
    pub fn new(
        deps: Arc<BotDeps>,
        lexicon: Lexicon,
        registry: IntentRegistry,
        normalizer: TextNormalizer,
        policy: ClassifyConfig,
    ) -> Self {
        Self {
            deps,
            lexicon,
            registry,
            normalizer,
            policy,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Run one full turn for `message`.
    pub async fn recognize(&self, message: InboundMessage) -> Result<()> {
        let lock = self.turn_lock(&message.channel_id);
        let _turn = lock.lock().await;

        let normalized = self.normalizer.normalize(&message.content);
        let Some(hit) = self.lexicon.classify(&normalized) else {
            return Ok(());
        };

        if let Some(max) = self.policy.max_distance {
            if hit.distance > max {
                tracing::debug!(
                    channel_id = %message.channel_id,
                    distance = hit.distance,
                    max_distance = max,
                    "input too far from any pattern, ignoring"
                );
                return Ok(());
            }
        }

        tracing::debug!(
            channel_id = %message.channel_id,
            distance = hit.distance,
            pattern = %hit.entry.pattern,
            "classified input"
        );

        match &hit.entry.payload {
            Payload::Dialog(lines) => self.send_dialog(&message, lines).await,
            Payload::Intention(id) if id == HELP_INTENTION => self.send_help(&message).await,
            Payload::Intention(id) => self.invoke(id, message).await,
        }
    }

    async fn send_dialog(&self, message: &InboundMessage, lines: &[String]) -> Result<()> {
        let line = {
            // ThreadRng is not Send; pick before awaiting.
            use rand::seq::IndexedRandom as _;
            let mut rng = rand::rng();
            lines.choose(&mut rng).cloned()
        };
        if let Some(line) = line {
            self.deps.chat.send_text(&message.channel_id, &line).await?;
        }
        Ok(())
    }

    /// Emit every registered documentation string as its own card, paced to
    /// stay under platform rate limits.
    async fn send_help(&self, message: &InboundMessage) -> Result<()> {
        let docs = self.registry.help_docs();
        for (index, doc) in docs.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.policy.help_pacing.0).await;
            }
            let card = Card::new(doc.clone()).titled("📖 Esto es lo que sé hacer");
            self.deps.chat.send_card(&message.channel_id, &card).await?;
        }
        Ok(())
    }

    async fn invoke(&self, id: &str, message: InboundMessage) -> Result<()> {
        let Some(handler) = self.registry.resolve(id) else {
            tracing::warn!(intention = %id, "classified intention has no registered handler");
            return Ok(());
        };
        let args = ParsedArguments::extract(&message.content);
        handler(Arc::clone(&self.deps), message, args).await
    }

    fn turn_lock(&self, channel: &ChannelId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.turn_locks.lock().expect("turn lock map poisoned");
        Arc::clone(locks.entry(channel.clone()).or_default())
    }
}
