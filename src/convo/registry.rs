//! Intention handler registry.
//!
//! An explicit object built at startup and owned by the dispatcher. No
//! process-wide state; two bot instances can carry two disjoint registries.

use crate::text::ParsedArguments;
use crate::{BotDeps, InboundMessage, Result};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Boxed async handler for one intention.
pub type IntentHandler =
    Arc<dyn Fn(Arc<BotDeps>, InboundMessage, ParsedArguments) -> HandlerFuture + Send + Sync>;

#[derive(Default)]
pub struct IntentRegistry {
    handlers: HashMap<String, IntentHandler>,
    help: Vec<String>,
}

impl IntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `id`. Re-registration replaces the handler;
    /// a non-empty `doc` is appended to the ordered help list either way, so
    /// duplicate docs are possible and tolerated.
    pub fn register<F, Fut>(&mut self, id: impl Into<String>, handler: F, doc: impl Into<String>)
    where
        F: Fn(Arc<BotDeps>, InboundMessage, ParsedArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: IntentHandler =
            Arc::new(move |deps, message, args| Box::pin(handler(deps, message, args)));
        self.handlers.insert(id.into(), handler);
        let doc = doc.into();
        if !doc.is_empty() {
            self.help.push(doc);
        }
    }

    pub fn resolve(&self, id: &str) -> Option<IntentHandler> {
        self.handlers.get(id).cloned()
    }

    /// Documentation strings in registration order.
    pub fn help_docs(&self) -> &[String] {
        &self.help
    }
}
