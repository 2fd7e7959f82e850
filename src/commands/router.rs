//! Command Router
//!
//! Fixed mapping from command name to handler, built once at startup.

use super::handlers::HelpCommand;
use super::{CommandHandler, CommandReply, CommandRequest};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Router construction errors
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("{0} is already a registered command")]
    Duplicate(String),
}

/// Dispatches requests to handlers by command name
pub struct CommandRouter {
    /// Handlers in registration order
    handlers: Vec<Arc<dyn CommandHandler>>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter")
            .field("commands", &self.names())
            .finish()
    }
}

impl CommandRouter {
    /// Build a router, rejecting duplicate command names
    pub fn new(handlers: Vec<Arc<dyn CommandHandler>>) -> Result<Self, RouterError> {
        let mut index = HashMap::with_capacity(handlers.len());
        for (i, handler) in handlers.iter().enumerate() {
            let name = handler.name().to_string();
            if index.insert(name.clone(), i).is_some() {
                return Err(RouterError::Duplicate(name));
            }
        }
        Ok(Self { handlers, index })
    }

    /// Build a router whose `help` command lists `handlers` and itself
    pub fn with_help(mut handlers: Vec<Arc<dyn CommandHandler>>) -> Result<Self, RouterError> {
        let mut names: Vec<String> = handlers.iter().map(|h| h.name().to_string()).collect();
        names.push(HelpCommand::NAME.to_string());
        handlers.push(Arc::new(HelpCommand::new(names)));
        Self::new(handlers)
    }

    /// Registered command names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn get(&self, command: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.index.get(command).map(|&i| &self.handlers[i])
    }

    /// Run a request and turn every outcome into reply text.
    ///
    /// Handler errors never escape: chat platform failures and internal
    /// failures are both reported to the requester.
    pub async fn dispatch(&self, request: &CommandRequest) -> CommandReply {
        let Some(handler) = self.get(&request.command) else {
            warn!(command = %request.command, "Unknown command");
            return CommandReply::text(format!("Error: unknown command '{}'", request.command));
        };

        info!(
            command = %request.command,
            user = %request.user_name,
            channel = %request.channel_name,
            "Running handler"
        );

        match handler.execute(request).await {
            Ok(reply) => {
                debug!(command = %request.command, reply = ?reply.text, "Handler returned");
                reply
            }
            Err(e) if e.is_chat_platform() => {
                error!(command = %request.command, error = %e, "Chat platform error");
                CommandReply::text(format!("Slack responded with error: {}", e))
            }
            Err(e) => {
                error!(command = %request.command, error = %e, "Command failed");
                CommandReply::text(format!("Error: {}", e))
            }
        }
    }
}
