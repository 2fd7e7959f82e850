//! In-memory chat client.
//!
//! Keeps posted messages and reactions in process. Used by `votebot simulate`
//! and by tests, which can also script platform failures.

use super::{ChatClient, ChatError, ChatResult, MessageReactions, MessageRef, Reaction};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A message recorded by [`MemoryChatClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub message: MessageRef,
    pub text: String,
}

#[derive(Debug, Default)]
struct Inner {
    posted: Vec<PostedMessage>,
    reactions: HashMap<MessageRef, Vec<Reaction>>,
    next_ts: u64,
    fail_post_after: Option<usize>,
    fail_reactions: bool,
    fail_reads: bool,
    yield_calls: bool,
}

/// Chat client that never leaves the process
#[derive(Debug, Default)]
pub struct MemoryChatClient {
    inner: Mutex<Inner>,
}

impl MemoryChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every post after the first `count` successful ones fail
    pub fn fail_posts_after(&self, count: usize) {
        self.inner.lock().fail_post_after = Some(count);
    }

    /// Make `add_reaction` fail
    pub fn fail_reactions(&self, fail: bool) {
        self.inner.lock().fail_reactions = fail;
    }

    /// Make `get_reactions` fail
    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().fail_reads = fail;
    }

    /// Yield to the scheduler at the start of every call, so concurrent
    /// requests interleave the way they do against the real platform
    pub fn yield_on_calls(&self, enabled: bool) {
        self.inner.lock().yield_calls = enabled;
    }

    async fn maybe_yield(&self) {
        let enabled = self.inner.lock().yield_calls;
        if enabled {
            tokio::task::yield_now().await;
        }
    }

    /// Add `count` user reactions with `emoji` to a message
    pub fn react(&self, message: &MessageRef, emoji: &str, count: u64) {
        let mut inner = self.inner.lock();
        bump(inner.reactions.entry(message.clone()).or_default(), emoji, count);
    }

    /// Every message posted so far, in order
    pub fn posted(&self) -> Vec<PostedMessage> {
        self.inner.lock().posted.clone()
    }

    /// Messages posted to one channel id
    pub fn posted_in(&self, channel_id: &str) -> Vec<PostedMessage> {
        self.posted()
            .into_iter()
            .filter(|p| p.message.channel == channel_id)
            .collect()
    }

    /// Reactions currently on a message
    pub fn reactions_on(&self, message: &MessageRef) -> Vec<Reaction> {
        self.inner
            .lock()
            .reactions
            .get(message)
            .cloned()
            .unwrap_or_default()
    }
}

/// Channel id the platform would report for a channel name
pub fn channel_id(channel: &str) -> String {
    channel.trim_start_matches('#').to_string()
}

fn bump(reactions: &mut Vec<Reaction>, emoji: &str, count: u64) {
    match reactions.iter_mut().find(|r| r.name == emoji) {
        Some(existing) => existing.count += count,
        None => reactions.push(Reaction {
            name: emoji.to_string(),
            count,
        }),
    }
}

#[async_trait]
impl ChatClient for MemoryChatClient {
    async fn post_message(&self, channel: &str, text: &str) -> ChatResult<MessageRef> {
        self.maybe_yield().await;
        let mut inner = self.inner.lock();
        if let Some(limit) = inner.fail_post_after {
            if inner.posted.len() >= limit {
                return Err(ChatError::Api("msg_too_long".to_string()));
            }
        }

        inner.next_ts += 1;
        let message = MessageRef::new(channel_id(channel), format!("{}.000000", inner.next_ts));
        inner.posted.push(PostedMessage {
            message: message.clone(),
            text: text.to_string(),
        });
        Ok(message)
    }

    async fn add_reaction(&self, emoji: &str, message: &MessageRef) -> ChatResult<()> {
        self.maybe_yield().await;
        let mut inner = self.inner.lock();
        if inner.fail_reactions {
            return Err(ChatError::RateLimited { retry_after: 1 });
        }
        if !inner.posted.iter().any(|p| &p.message == message) {
            return Err(ChatError::Api("message_not_found".to_string()));
        }
        bump(inner.reactions.entry(message.clone()).or_default(), emoji, 1);
        Ok(())
    }

    async fn get_reactions(&self, message: &MessageRef) -> ChatResult<MessageReactions> {
        self.maybe_yield().await;
        let inner = self.inner.lock();
        if inner.fail_reads {
            return Err(ChatError::Network("connection reset".to_string()));
        }
        let posted = inner
            .posted
            .iter()
            .find(|p| &p.message == message)
            .ok_or_else(|| ChatError::Api("message_not_found".to_string()))?;

        Ok(MessageReactions {
            text: posted.text.clone(),
            reactions: inner.reactions.get(message).cloned().unwrap_or_default(),
        })
    }
}
