//! Typed configuration structures
//!
//! Every section has defaults, so an empty file (or none at all) yields a
//! usable configuration apart from the Slack tokens.

use crate::channels::SlackConfig;
use crate::logging::TracingConfig;
use crate::polls::{DEFAULT_MARKER_EMOJI, DEFAULT_POST_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    pub server: ServerConfig,
    pub slack: SlackSettings,
    pub polls: PollSettings,
    pub tracing: TracingConfig,
}

/// HTTP listener for inbound commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Slack credentials and API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackSettings {
    /// Bot token (xoxb-...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// File holding the bot token, read when `botToken` is unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token_file: Option<PathBuf>,
    /// Token Slack sends with outgoing-webhook requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    /// File holding the verification token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token_file: Option<PathBuf>,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for SlackSettings {
    fn default() -> Self {
        let defaults = SlackConfig::default();
        Self {
            bot_token: None,
            bot_token_file: None,
            verification_token: None,
            verification_token_file: None,
            api_base_url: defaults.api_base_url,
            timeout_secs: defaults.timeout_secs,
        }
    }
}

impl SlackSettings {
    /// Resolve the client configuration, reading the token file if needed
    pub fn client_config(&self) -> Result<SlackConfig, ConfigError> {
        let bot_token = resolve_secret(&self.bot_token, self.bot_token_file.as_deref())?
            .ok_or_else(|| {
                ConfigError::Invalid(vec!["slack.botToken is required".to_string()])
            })?;
        Ok(SlackConfig {
            bot_token,
            api_base_url: self.api_base_url.clone(),
            timeout_secs: self.timeout_secs,
        })
    }

    /// Resolve the inbound verification token, if one is configured
    pub fn verification_token(&self) -> Result<Option<String>, ConfigError> {
        resolve_secret(
            &self.verification_token,
            self.verification_token_file.as_deref(),
        )
    }
}

/// Poll catalog, open-poll storage and posting behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollSettings {
    /// JSON5 file listing the voteable polls
    pub catalog_path: PathBuf,
    /// JSON file of open polls; open polls are kept in memory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// Pause between option posts when opening a poll
    pub post_interval_ms: u64,
    /// Marker emoji for catalog entries that do not name one
    pub default_marker_emoji: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("votebot-catalog.json5"),
            store_path: None,
            post_interval_ms: DEFAULT_POST_INTERVAL.as_millis() as u64,
            default_marker_emoji: DEFAULT_MARKER_EMOJI.to_string(),
        }
    }
}

impl PollSettings {
    pub fn post_interval(&self) -> Duration {
        Duration::from_millis(self.post_interval_ms)
    }
}

impl BotConfig {
    /// Check the values that defaults cannot fix
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be non-zero".to_string());
        }
        if self.slack.bot_token.is_none() && self.slack.bot_token_file.is_none() {
            errors.push("slack.botToken or slack.botTokenFile is required".to_string());
        }
        if matches!(&self.slack.bot_token, Some(t) if t.trim().is_empty()) {
            errors.push("slack.botToken is empty".to_string());
        }
        if self.slack.timeout_secs == 0 {
            errors.push("slack.timeoutSecs must be non-zero".to_string());
        }
        if self.polls.default_marker_emoji.trim().is_empty() {
            errors.push("polls.defaultMarkerEmoji is empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Override secrets from environment lookups (`VOTEBOT_SLACK_*`)
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("VOTEBOT_SLACK_BOT_TOKEN").filter(|t| !t.is_empty()) {
            self.slack.bot_token = Some(token);
        }
        if let Some(token) =
            lookup("VOTEBOT_SLACK_VERIFICATION_TOKEN").filter(|t| !t.is_empty())
        {
            self.slack.verification_token = Some(token);
        }
    }
}

/// Inline value wins over file; file contents are trimmed
fn resolve_secret(
    inline: &Option<String>,
    file: Option<&Path>,
) -> Result<Option<String>, ConfigError> {
    if let Some(value) = inline {
        return Ok(Some(value.trim().to_string()));
    }
    match file {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            Ok(Some(raw.trim().to_string()))
        }
        None => Ok(None),
    }
}
