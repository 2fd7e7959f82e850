//! Built-in command handlers

use super::{CommandHandler, CommandReply, CommandRequest};
use crate::channels::DynChatClient;
use crate::polls::{OptionCatalog, PollAnnouncer, PollCloser, VoteError};
use async_trait::async_trait;
use std::sync::Arc;

/// `ping`: liveness check
pub struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    fn name(&self) -> &str {
        "ping"
    }

    async fn execute(&self, _request: &CommandRequest) -> Result<CommandReply, VoteError> {
        Ok(CommandReply::text("pong"))
    }
}

/// `help`: lists the available commands
pub struct HelpCommand {
    names: Vec<String>,
}

impl HelpCommand {
    pub const NAME: &'static str = "help";

    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl CommandHandler for HelpCommand {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, _request: &CommandRequest) -> Result<CommandReply, VoteError> {
        Ok(CommandReply::text(format!(
            "You can use the following commands: {}",
            self.names.join(" , ")
        )))
    }
}

/// `list`: posts the catalog's poll names to the channel
pub struct ListCommand {
    catalog: Arc<dyn OptionCatalog>,
    chat: DynChatClient,
}

impl ListCommand {
    pub fn new(catalog: Arc<dyn OptionCatalog>, chat: DynChatClient) -> Self {
        Self { catalog, chat }
    }
}

#[async_trait]
impl CommandHandler for ListCommand {
    fn name(&self) -> &str {
        "list"
    }

    async fn execute(&self, request: &CommandRequest) -> Result<CommandReply, VoteError> {
        let names = self.catalog.names().await?;
        let text = format!("The following votes can be cast: {}", names.join(" , "));
        self.chat.post_message(&request.channel(), &text).await?;
        Ok(CommandReply::empty())
    }
}

/// `open <poll name>`
pub struct OpenCommand {
    announcer: PollAnnouncer,
}

impl OpenCommand {
    pub fn new(announcer: PollAnnouncer) -> Self {
        Self { announcer }
    }
}

#[async_trait]
impl CommandHandler for OpenCommand {
    fn name(&self) -> &str {
        "open"
    }

    async fn execute(&self, request: &CommandRequest) -> Result<CommandReply, VoteError> {
        let poll_name = request.arg(0, "poll name")?;
        let outcome = self
            .announcer
            .open(poll_name, &request.user_name, &request.channel())
            .await?;
        Ok(outcome.reply_text().into())
    }
}

/// `close <poll id>`
pub struct CloseCommand {
    closer: PollCloser,
}

impl CloseCommand {
    pub fn new(closer: PollCloser) -> Self {
        Self { closer }
    }
}

#[async_trait]
impl CommandHandler for CloseCommand {
    fn name(&self) -> &str {
        "close"
    }

    async fn execute(&self, request: &CommandRequest) -> Result<CommandReply, VoteError> {
        let poll_id = request.arg(0, "poll id")?;
        let outcome = self
            .closer
            .close(poll_id, &request.user_name, &request.channel())
            .await?;
        Ok(outcome.reply_text().into())
    }
}
