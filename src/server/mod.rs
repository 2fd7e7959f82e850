//! HTTP adapter
//!
//! Accepts Slack outgoing-webhook and slash-command form posts, runs the
//! command and answers with `{ "text": ... }`.

use crate::commands::{CommandReply, CommandRequest, CommandRouter};
use crate::config::ServerConfig;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid bind address: {0}")]
    Address(String),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared request state
pub struct AppState {
    pub router: CommandRouter,
    /// Token Slack must echo back; requests are not checked when unset
    pub verification_token: Option<String>,
}

/// Form fields Slack posts; unknown fields are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandForm {
    #[serde(default)]
    pub token: Option<String>,
    /// Slash command name (`/votebot`), absent for outgoing webhooks
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub user_name: String,
}

impl CommandForm {
    /// Outgoing webhooks put the trigger word in `text`; slash commands send
    /// it separately
    pub fn into_request(self) -> CommandRequest {
        let text = match &self.command {
            Some(command) => format!("{} {}", command, self.text),
            None => self.text,
        };
        CommandRequest::parse(&text, self.channel_name, self.user_name)
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Create the HTTP router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(command_handler))
        .route("/command", post(command_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn command_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CommandForm>,
) -> Response {
    if let Some(expected) = &state.verification_token {
        if form.token.as_deref() != Some(expected.as_str()) {
            warn!(channel = %form.channel_name, user = %form.user_name, "Rejected request with bad token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(CommandReply::text("Error: invalid token")),
            )
                .into_response();
        }
    }

    let request = form.into_request();
    Json(state.router.dispatch(&request).await).into_response()
}

/// Serve until Ctrl-C
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|e: std::net::AddrParseError| ServerError::Address(e.to_string()))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, commands = ?state.router.names(), "Listening for commands");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
