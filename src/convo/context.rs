//! Per-channel conversation context.
//!
//! Handlers read and write small pieces of state across turns (last search
//! results, listed songs, a bare context value). Keys are scoped per
//! conversation channel; reading anything unset yields an empty value. No
//! expiry — cardinality is bounded by active channel count.

use crate::ChannelId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct ChannelContext {
    value: String,
    vars: HashMap<String, Value>,
}

/// Per-conversation-channel key/value state. Cheap to clone; all clones
/// share the same store.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    inner: Arc<RwLock<HashMap<ChannelId, ChannelContext>>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bare context value for the channel; empty if unset.
    pub async fn get(&self, channel: &ChannelId) -> String {
        let inner = self.inner.read().await;
        inner
            .get(channel)
            .map(|context| context.value.clone())
            .unwrap_or_default()
    }

    pub async fn set(&self, channel: &ChannelId, value: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.entry(channel.clone()).or_default().value = value.into();
    }

    /// Reset the bare value to empty. Named vars are untouched.
    pub async fn clear(&self, channel: &ChannelId) {
        self.set(channel, "").await;
    }

    /// Named context var for the channel; `Value::Null` if unset.
    pub async fn get_var(&self, channel: &ChannelId, name: &str) -> Value {
        let inner = self.inner.read().await;
        inner
            .get(channel)
            .and_then(|context| context.vars.get(name).cloned())
            .unwrap_or(Value::Null)
    }

    pub async fn set_var(&self, channel: &ChannelId, name: impl Into<String>, value: Value) {
        let mut inner = self.inner.write().await;
        inner
            .entry(channel.clone())
            .or_default()
            .vars
            .insert(name.into(), value);
    }
}
