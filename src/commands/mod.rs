//! Chat Commands
//!
//! Typed command requests, the handler interface and the router that maps
//! command names to handlers.

pub mod handlers;
pub mod router;

use crate::channels::DynChatClient;
use crate::polls::{OptionCatalog, PollAnnouncer, PollCloser, PollInstanceStore, VoteError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use handlers::{CloseCommand, HelpCommand, ListCommand, OpenCommand, PingCommand};
pub use router::{CommandRouter, RouterError};

/// A command addressed to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Command name, e.g. `open`
    pub command: String,
    /// Positional arguments after the command name
    pub args: Vec<String>,
    /// Channel name without the leading `#`
    pub channel_name: String,
    pub user_name: String,
}

impl CommandRequest {
    /// Parse message text of the form `<trigger> <command> [args...]`.
    ///
    /// The trigger word (usually `votebot`) is dropped. Text without a
    /// command becomes `help`.
    pub fn parse(
        text: &str,
        channel_name: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        let mut words = text.split_whitespace().skip(1).map(str::to_string);
        let command = words
            .next()
            .map(|c| c.to_lowercase())
            .unwrap_or_else(|| "help".to_string());

        Self {
            command,
            args: words.collect(),
            channel_name: channel_name.into(),
            user_name: user_name.into(),
        }
    }

    /// Channel address as the platform expects it (`#name`)
    pub fn channel(&self) -> String {
        format!("#{}", self.channel_name.trim_start_matches('#'))
    }

    /// Positional argument `index`, or a `MissingArgument` error naming it
    pub fn arg(&self, index: usize, name: &'static str) -> Result<&str, VoteError> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or(VoteError::MissingArgument(name))
    }
}

/// Reply returned to the requester only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CommandReply {
    /// Reply with no text
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

impl From<Option<String>> for CommandReply {
    fn from(text: Option<String>) -> Self {
        Self { text }
    }
}

/// A named chat command
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name the command is invoked by
    fn name(&self) -> &str;

    /// Run the command
    async fn execute(&self, request: &CommandRequest) -> Result<CommandReply, VoteError>;
}

/// Shared dependencies of the poll commands
#[derive(Clone)]
pub struct PollServices {
    pub catalog: Arc<dyn OptionCatalog>,
    pub store: Arc<dyn PollInstanceStore>,
    pub chat: DynChatClient,
    /// Pause between option posts when opening a poll
    pub post_interval: Duration,
}

/// Build the router with every command the bot supports
pub fn standard_router(services: PollServices) -> Result<CommandRouter, RouterError> {
    let announcer = PollAnnouncer::new(
        services.catalog.clone(),
        services.store.clone(),
        services.chat.clone(),
    )
    .with_post_interval(services.post_interval);
    let closer = PollCloser::new(services.store.clone(), services.chat.clone());

    let handlers: Vec<Arc<dyn CommandHandler>> = vec![
        Arc::new(PingCommand),
        Arc::new(ListCommand::new(services.catalog, services.chat)),
        Arc::new(OpenCommand::new(announcer)),
        Arc::new(CloseCommand::new(closer)),
    ];
    CommandRouter::with_help(handlers)
}
