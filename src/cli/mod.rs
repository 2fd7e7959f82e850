//! CLI subcommand definitions and handlers.
//!
//! - `start` (default) -- serve chat commands over HTTP
//! - `config show|path` -- inspect configuration
//! - `catalog list` -- print the voteable polls
//! - `simulate` -- run one poll end to end against an in-memory chat
//! - `version` -- print build/version info

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::sync::Arc;

use crate::channels::{DynChatClient, MemoryChatClient, SlackClient};
use crate::commands::{standard_router, CommandRequest, PollServices};
use crate::config::{self, BotConfig};
use crate::polls::{FileCatalog, FileInstanceStore, MemoryInstanceStore, PollInstanceStore};
use crate::server::{self, AppState};

/// Reaction polls for chat channels.
#[derive(Parser, Debug)]
#[command(
    name = "votebot",
    version = env!("CARGO_PKG_VERSION"),
    about = "votebot -- open reaction polls in a chat channel and tally the results"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve chat commands over HTTP (default when no subcommand is given).
    Start,

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Inspect the poll catalog.
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Open and close a poll against an in-memory chat and print the transcript.
    Simulate {
        /// Catalog name of the poll to run.
        poll: String,

        /// Comma-separated extra votes per option, in option order (e.g. "3,0,1").
        #[arg(long, value_delimiter = ',')]
        votes: Vec<u64>,

        /// User opening and closing the poll.
        #[arg(long, default_value = "simulator")]
        user: String,

        /// Channel name to post to.
        #[arg(long, default_value = "general")]
        channel: String,
    },

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the loaded configuration (secrets redacted) as JSON.
    Show,

    /// Print the resolved configuration file path.
    Path,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Print every poll with its marker emoji and options.
    List,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

/// Secrets that should be redacted when printing config.
const SECRET_KEYS: &[&str] = &["token", "secret", "password"];

/// Run the `start` subcommand.
pub async fn handle_start(cfg: &BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(errors) = cfg.validate() {
        return Err(config::ConfigError::Invalid(errors).into());
    }

    let chat: DynChatClient = Arc::new(SlackClient::new(cfg.slack.client_config()?)?);
    let router = standard_router(poll_services(cfg, chat))?;
    let state = Arc::new(AppState {
        router,
        verification_token: cfg.slack.verification_token()?,
    });
    if state.verification_token.is_none() {
        tracing::warn!("No Slack verification token configured; accepting every request");
    }

    server::serve(&cfg.server, state).await?;
    Ok(())
}

/// Wire the catalog and store described by `cfg` to a chat client.
pub fn poll_services(cfg: &BotConfig, chat: DynChatClient) -> PollServices {
    let store: Arc<dyn PollInstanceStore> = match &cfg.polls.store_path {
        Some(path) => Arc::new(FileInstanceStore::new(path)),
        None => Arc::new(MemoryInstanceStore::new()),
    };
    PollServices {
        catalog: Arc::new(catalog(cfg)),
        store,
        chat,
        post_interval: cfg.polls.post_interval(),
    }
}

fn catalog(cfg: &BotConfig) -> FileCatalog {
    FileCatalog::new(
        &cfg.polls.catalog_path,
        cfg.polls.default_marker_emoji.clone(),
    )
}

/// Run the `config show` subcommand.
pub fn handle_config_show(cfg: &BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    let redacted = redact_secrets(serde_json::to_value(cfg)?);
    println!("{}", serde_json::to_string_pretty(&redacted)?);
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path() {
    println!("{}", config::get_config_path().display());
}

/// Run the `catalog list` subcommand.
pub async fn handle_catalog_list(cfg: &BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = catalog(cfg).load().await?;
    for def in catalog.definitions() {
        println!("{} (:{}:)", def.name, def.marker_emoji);
        for option in &def.options {
            println!("  - {}", option);
        }
    }
    Ok(())
}

/// Run the `simulate` subcommand.
///
/// Opens the poll, adds `votes` to the option messages, closes it, and
/// prints every message the bot posted plus the private replies.
pub async fn handle_simulate(
    cfg: &BotConfig,
    poll: &str,
    votes: &[u64],
    user: &str,
    channel: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let chat = Arc::new(MemoryChatClient::new());
    let mut services = poll_services(cfg, chat.clone());
    services.store = Arc::new(MemoryInstanceStore::new());
    services.post_interval = std::time::Duration::ZERO;
    let store = services.store.clone();
    let router = standard_router(services)?;

    let open = CommandRequest::parse(&format!("votebot open {}", poll), channel, user);
    print_reply(&router.dispatch(&open).await.text);

    let Some(poll_id) = store.list_ids().await?.into_iter().next() else {
        print_transcript(&chat);
        return Ok(());
    };
    if let Some(instance) = store.get(&poll_id).await? {
        for (message, extra) in instance.option_messages.iter().zip(votes) {
            if *extra > 0 {
                chat.react(message, "simulated_vote", *extra);
            }
        }
    }

    let close = CommandRequest::parse(&format!("votebot close {}", poll_id), channel, user);
    print_reply(&router.dispatch(&close).await.text);
    print_transcript(&chat);
    Ok(())
}

fn print_reply(text: &Option<String>) {
    if let Some(text) = text {
        println!("(reply) {}", text);
    }
}

fn print_transcript(chat: &MemoryChatClient) {
    for posted in chat.posted() {
        let reactions: u64 = chat
            .reactions_on(&posted.message)
            .iter()
            .map(|r| r.count)
            .sum();
        println!("[#{} {}] {}", posted.message.channel, posted.message.ts, posted.text);
        if reactions > 0 {
            println!("    reactions: {}", reactions);
        }
    }
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("votebot {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("VOTEBOT_BUILD_DATE"));
    println!("  Git commit: {}", env!("VOTEBOT_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Redact known secret keys in a JSON value (recursive).
fn redact_secrets(mut value: Value) -> Value {
    match &mut value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            for key in keys {
                let lower = key.to_lowercase();
                if SECRET_KEYS.iter().any(|s| lower.contains(s)) && !lower.ends_with("file") {
                    map.insert(key, Value::String("[REDACTED]".to_string()));
                } else if let Some(child) = map.remove(&key) {
                    map.insert(key, redact_secrets(child));
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                *item = redact_secrets(item.take());
            }
        }
        _ => {}
    }
    value
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
