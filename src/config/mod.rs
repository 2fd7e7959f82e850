//! Configuration loading
//!
//! The config file is JSON5. Its path comes from `VOTEBOT_CONFIG_PATH`,
//! then `./votebot.json5`, then `<config dir>/votebot/votebot.json5`.
//! A missing file means defaults.

mod types;

pub use types::{BotConfig, PollSettings, ServerConfig, SlackSettings};

use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "VOTEBOT_CONFIG_PATH";

const LOCAL_CONFIG_FILE: &str = "votebot.json5";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Resolve the config file path
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("votebot").join(LOCAL_CONFIG_FILE))
        .unwrap_or(local)
}

/// Load the configuration from the resolved path plus environment overrides
pub fn load_config() -> Result<BotConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

/// Load a config file without environment overrides
pub fn load_config_from(path: &Path) -> Result<BotConfig, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(BotConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };
    parse_config(&raw).map_err(|message| ConfigError::Parse {
        path: path.display().to_string(),
        message,
    })
}

/// Parse JSON5 config text
pub fn parse_config(raw: &str) -> Result<BotConfig, String> {
    if raw.trim().is_empty() {
        return Ok(BotConfig::default());
    }
    json5::from_str(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.slack.api_base_url, "https://slack.com/api");
        assert_eq!(config.polls.post_interval_ms, 500);
        assert_eq!(config.polls.default_marker_emoji, "ballot_box_with_check");
        assert!(config.polls.store_path.is_none());
        assert!(config.tracing.enabled);
    }

    #[test]
    fn test_parse_partial_json5() {
        let config = parse_config(
            r#"{
                // only override what matters
                server: { port: 8080 },
                slack: { botToken: "xoxb-1", verificationToken: "abc" },
                polls: { storePath: "/var/lib/votebot/open.json", postIntervalMs: 750 },
                tracing: { enabled: false, logLevel: "debug", format: "text" },
            }"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-1"));
        assert_eq!(config.polls.post_interval().as_millis(), 750);
        assert_eq!(
            config.polls.store_path.as_deref(),
            Some(Path::new("/var/lib/votebot/open.json"))
        );
        assert!(!config.tracing.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        assert!(parse_config("{ server: ").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.json5")).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_parse_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votebot.json5");
        std::fs::write(&path, "{ nope").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("votebot.json5"));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut config = BotConfig::default();
        config.server.port = 0;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("server.port")));
        assert!(errors.iter().any(|e| e.contains("slack.botToken")));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VOTEBOT_SLACK_BOT_TOKEN", "xoxb-env"),
            ("VOTEBOT_SLACK_VERIFICATION_TOKEN", ""),
        ]
        .into_iter()
        .collect();

        let mut config = parse_config(r#"{ slack: { botToken: "xoxb-file", verificationToken: "v" } }"#)
            .unwrap();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-env"));
        assert_eq!(config.slack.verification_token.as_deref(), Some("v"));
    }

    #[test]
    fn test_tokens_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let bot = dir.path().join("SLACK_BOT_API_TOKEN");
        let verify = dir.path().join("SLACK_CHANNEL_TOKEN");
        std::fs::write(&bot, "xoxb-from-file\n").unwrap();
        std::fs::write(&verify, "  chan-token \n").unwrap();

        let mut config = BotConfig::default();
        config.slack.bot_token_file = Some(bot);
        config.slack.verification_token_file = Some(verify);

        assert_eq!(config.slack.client_config().unwrap().bot_token, "xoxb-from-file");
        assert_eq!(
            config.slack.verification_token().unwrap().as_deref(),
            Some("chan-token")
        );
    }

    #[test]
    fn test_missing_token_file() {
        let mut config = BotConfig::default();
        config.slack.bot_token_file = Some(PathBuf::from("/nonexistent/token"));
        assert!(matches!(
            config.slack.client_config(),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_no_token_configured() {
        let config = BotConfig::default();
        assert!(matches!(
            config.slack.client_config(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(config.slack.verification_token().unwrap().is_none());
    }
}
