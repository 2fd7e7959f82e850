//! Chat Platform Client
//!
//! Defines the interface the poll lifecycle uses to talk to the chat
//! platform: posting messages, attaching reactions and reading them back.

pub mod memory;
pub mod slack;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use memory::MemoryChatClient;
pub use slack::{SlackClient, SlackConfig};

/// Result type for chat platform operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors returned by the chat platform
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Api(String),

    #[error("rate limited: retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Reference to a posted message.
///
/// Carries the channel id and message timestamp the platform needs to
/// address the message again later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    /// Channel id as reported by the platform (not the `#name`)
    pub channel: String,
    /// Message timestamp, unique within the channel
    pub ts: String,
}

impl MessageRef {
    pub fn new(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ts: ts.into(),
        }
    }
}

impl std::fmt::Display for MessageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel, self.ts)
    }
}

/// A single reaction on a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Emoji name without colons
    pub name: String,
    /// Number of users who reacted with this emoji
    pub count: u64,
}

/// A message together with its current reactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageReactions {
    /// Message text as currently shown in the channel
    pub text: String,
    pub reactions: Vec<Reaction>,
}

impl MessageReactions {
    /// Sum of all reaction counts on the message
    pub fn total_count(&self) -> u64 {
        self.reactions.iter().map(|r| r.count).sum()
    }
}

/// Chat platform operations used by the poll lifecycle
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Post visible text to a channel (name like `#general` or an id)
    async fn post_message(&self, channel: &str, text: &str) -> ChatResult<MessageRef>;

    /// Attach a reaction to a message
    async fn add_reaction(&self, emoji: &str, message: &MessageRef) -> ChatResult<()>;

    /// Fetch a message's text and reactions
    async fn get_reactions(&self, message: &MessageRef) -> ChatResult<MessageReactions>;
}

/// Type-erased client for sharing between handlers
pub type DynChatClient = Arc<dyn ChatClient>;
