//! Outbound transport trait and the console adapter.

use crate::error::Result;
use crate::{Card, ChannelId};
use async_trait::async_trait;

/// Outbound side of the chat-platform transport.
///
/// The inbound side is push-driven: the platform adapter feeds
/// [`crate::InboundMessage`]s into [`crate::convo::Dispatcher::recognize`].
#[async_trait]
pub trait Chat: Send + Sync {
    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<()>;

    async fn send_card(&self, channel: &ChannelId, card: &Card) -> Result<()>;

    /// Add a reaction emoji to the triggering message. Adapters without
    /// reactions may drop this.
    async fn react(&self, channel: &ChannelId, message_id: &str, emoji: &str) -> Result<()>;
}

/// Console adapter: prints outbound traffic to stdout. Serves the REPL in
/// `main.rs` and stands in for a platform adapter in examples.
pub struct ConsoleChat;

#[async_trait]
impl Chat for ConsoleChat {
    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<()> {
        println!("[{channel}] {text}");
        Ok(())
    }

    async fn send_card(&self, channel: &ChannelId, card: &Card) -> Result<()> {
        let mut rendered = String::new();
        if let Some(title) = &card.title {
            rendered.push_str(&format!("== {title} ==\n"));
        }
        rendered.push_str(&card.description);
        for field in &card.fields {
            rendered.push_str(&format!("\n{}: {}", field.name, field.value));
        }
        println!("[{channel}]\n{rendered}");
        Ok(())
    }

    async fn react(&self, channel: &ChannelId, _message_id: &str, emoji: &str) -> Result<()> {
        println!("[{channel}] *{emoji}*");
        Ok(())
    }
}
