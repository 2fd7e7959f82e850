//! Structured logging
//!
//! Installs a `tracing` subscriber with an env filter and a JSON or plain
//! text formatter.

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Logging error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("initialization error: {0}")]
    InitError(String),
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TracingConfig {
    /// Install a subscriber at startup
    pub enabled: bool,
    /// Service name stamped on the first log line
    pub service_name: String,
    /// Filter directive, e.g. `info` or `votebot=debug`; `RUST_LOG` wins
    pub log_level: String,
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "votebot".to_string(),
            log_level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable lines
    Text,
}

/// Build the filter from `RUST_LOG`, falling back to the configured level
fn env_filter(config: &TracingConfig) -> Result<EnvFilter, TracingError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.log_level),
    };
    filter.map_err(|e| TracingError::InitError(e.to_string()))
}

/// Initialize logging with the given configuration
pub fn init_tracing(config: &TracingConfig) -> Result<(), TracingError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = env_filter(config)?;

    let installed = match config.format {
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };
    installed.map_err(|e| TracingError::InitError(e.to_string()))?;

    info!(service = %config.service_name, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config_default() {
        let config = TracingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.service_name, "votebot");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_disabled_is_noop() {
        let config = TracingConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_tracing(&config).is_ok());
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let config: TracingConfig =
            serde_json::from_value(serde_json::json!({ "format": "text" })).unwrap();
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.log_level, "info");
    }
}
