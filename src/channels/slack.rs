//! Slack Client Implementation
//!
//! Talks to the Slack Web API: `chat.postMessage`, `reactions.add` and
//! `reactions.get`.

use super::{ChatClient, ChatError, ChatResult, MessageReactions, MessageRef, Reaction};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Slack client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot token from the Slack app (xoxb-...)
    pub bot_token: String,
    /// Base URL of the Web API
    pub api_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: "https://slack.com/api".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Slack Web API client
#[derive(Debug, Clone)]
pub struct SlackClient {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackClient {
    /// Create a new Slack client
    pub fn new(config: SlackConfig) -> ChatResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), method)
    }

    /// Send a form-encoded request to the Slack API and decode the envelope
    async fn api_request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> ChatResult<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .bearer_auth(&self.config.bot_token)
            .form(params)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_secs(response.headers());
            warn!(method = %method, retry_after, "Slack rate limit hit");
            return Err(ChatError::RateLimited { retry_after });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        check_envelope(&json)?;

        debug!(method = %method, "Slack API call succeeded");
        serde_json::from_value(json).map_err(|e| ChatError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ChatClient for SlackClient {
    async fn post_message(&self, channel: &str, text: &str) -> ChatResult<MessageRef> {
        let resp: PostMessageResponse = self
            .api_request(
                "chat.postMessage",
                &[("channel", channel), ("text", text), ("as_user", "true")],
            )
            .await?;
        Ok(MessageRef::new(resp.channel, resp.ts))
    }

    async fn add_reaction(&self, emoji: &str, message: &MessageRef) -> ChatResult<()> {
        let _: serde_json::Value = self
            .api_request(
                "reactions.add",
                &[
                    ("name", emoji),
                    ("channel", message.channel.as_str()),
                    ("timestamp", message.ts.as_str()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_reactions(&self, message: &MessageRef) -> ChatResult<MessageReactions> {
        let resp: ReactionsGetResponse = self
            .api_request(
                "reactions.get",
                &[
                    ("channel", message.channel.as_str()),
                    ("timestamp", message.ts.as_str()),
                    ("full", "true"),
                ],
            )
            .await?;

        Ok(MessageReactions {
            text: resp.message.text,
            reactions: resp
                .message
                .reactions
                .into_iter()
                .map(|r| Reaction {
                    name: r.name,
                    count: r.count,
                })
                .collect(),
        })
    }
}

/// Map a Slack `{ "ok": false, "error": ... }` envelope to an error
fn check_envelope(json: &serde_json::Value) -> ChatResult<()> {
    if json.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        return Ok(());
    }

    let error_msg = json
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown error");
    if error_msg == "ratelimited" {
        return Err(ChatError::RateLimited { retry_after: 1 });
    }
    Err(ChatError::Api(error_msg.to_string()))
}

fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(1)
}

// Slack API response types

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    channel: String,
    ts: String,
}

#[derive(Debug, Deserialize)]
struct ReactionsGetResponse {
    message: SlackMessage,
}

#[derive(Debug, Deserialize)]
struct SlackMessage {
    #[serde(default)]
    text: String,
    #[serde(default)]
    reactions: Vec<SlackReaction>,
}

#[derive(Debug, Deserialize)]
struct SlackReaction {
    name: String,
    count: u64,
}
