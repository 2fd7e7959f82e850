//! Option Catalog
//!
//! Read-only lookup of poll definitions. Entries are maintained by hand in a
//! JSON5 file:
//!
//! ```json5
//! [
//!   { selection: "lunch", options: ["Tacos / Crunchy shell", "Pho / Beef"], iconEmoji: "fork_and_knife" },
//!   { selection: "standup", options: "Monday, Wednesday, Friday" },
//! ]
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Marker emoji used when a catalog entry does not name one
pub const DEFAULT_MARKER_EMOJI: &str = "ballot_box_with_check";

/// Separator for options stored as a single string
const OPTION_DELIMITER: char = ',';

/// Catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse catalog: {0}")]
    Parse(String),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// A voteable topic and its options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollDefinition {
    /// Catalog key
    pub name: String,
    /// Option lines in display order, conventionally `short / description`
    pub options: Vec<String>,
    /// Reaction attached to every option message at open time
    pub marker_emoji: String,
}

impl PollDefinition {
    pub fn new(name: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            name: name.into(),
            options,
            marker_emoji: DEFAULT_MARKER_EMOJI.to_string(),
        }
    }

    pub fn with_marker_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.marker_emoji = emoji.into();
        self
    }
}

/// Catalog entry as written in the file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    selection: String,
    options: OptionList,
    #[serde(default, alias = "icon_emoji")]
    icon_emoji: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionList {
    List(Vec<String>),
    Delimited(String),
}

impl OptionList {
    fn into_options(self) -> Vec<String> {
        let raw = match self {
            OptionList::List(items) => items,
            OptionList::Delimited(joined) => joined
                .split(OPTION_DELIMITER)
                .map(str::to_string)
                .collect(),
        };
        raw.into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}

/// Read access to poll definitions
#[async_trait]
pub trait OptionCatalog: Send + Sync {
    /// Look up a definition by name
    async fn lookup(&self, name: &str) -> Result<Option<PollDefinition>, CatalogError>;

    /// All definition names in catalog order
    async fn names(&self) -> Result<Vec<String>, CatalogError>;
}

/// Catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    definitions: Vec<PollDefinition>,
}

impl StaticCatalog {
    /// Build a catalog, rejecting duplicate names and empty option lists
    pub fn new(definitions: Vec<PollDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.name.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate selection '{}'",
                    def.name
                )));
            }
            if def.options.is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "selection '{}' has no options",
                    def.name
                )));
            }
        }
        Ok(Self { definitions })
    }

    /// Parse catalog text, filling in `default_emoji` where an entry has none
    pub fn parse(raw: &str, default_emoji: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> =
            json5::from_str(raw).map_err(|e| CatalogError::Parse(e.to_string()))?;

        let definitions = entries
            .into_iter()
            .map(|entry| PollDefinition {
                name: entry.selection.trim().to_string(),
                options: entry.options.into_options(),
                marker_emoji: entry
                    .icon_emoji
                    .map(|e| e.trim().trim_matches(':').to_string())
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| default_emoji.to_string()),
            })
            .collect();

        Self::new(definitions)
    }

    pub fn definitions(&self) -> &[PollDefinition] {
        &self.definitions
    }
}

#[async_trait]
impl OptionCatalog for StaticCatalog {
    async fn lookup(&self, name: &str) -> Result<Option<PollDefinition>, CatalogError> {
        Ok(self.definitions.iter().find(|d| d.name == name).cloned())
    }

    async fn names(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.definitions.iter().map(|d| d.name.clone()).collect())
    }
}

/// Catalog backed by a JSON5 file, re-read on every access so edits take
/// effect without a restart
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
    default_emoji: String,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>, default_emoji: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_emoji: default_emoji.into(),
        }
    }

    /// Read and parse the whole file
    pub async fn load(&self) -> Result<StaticCatalog, CatalogError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CatalogError::Read {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        let catalog = StaticCatalog::parse(&raw, &self.default_emoji)?;
        debug!(path = %self.path.display(), entries = catalog.definitions.len(), "Loaded catalog");
        Ok(catalog)
    }
}

#[async_trait]
impl OptionCatalog for FileCatalog {
    async fn lookup(&self, name: &str) -> Result<Option<PollDefinition>, CatalogError> {
        self.load().await?.lookup(name).await
    }

    async fn names(&self) -> Result<Vec<String>, CatalogError> {
        self.load().await?.names().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        // lunch options
        [
            {
                selection: "lunch",
                options: ["Tacos / Crunchy shell with beef", " Pho / Beef broth "],
                iconEmoji: ":fork_and_knife:",
            },
            { selection: "standup", options: "Monday, Wednesday,, Friday" },
            { selection: "legacy", options: "A, B", icon_emoji: "thumbsup" },
        ]
    "#;

    #[tokio::test]
    async fn test_parse_list_options() {
        let catalog = StaticCatalog::parse(SAMPLE, DEFAULT_MARKER_EMOJI).unwrap();
        let lunch = catalog.lookup("lunch").await.unwrap().unwrap();
        assert_eq!(
            lunch.options,
            vec!["Tacos / Crunchy shell with beef", "Pho / Beef broth"]
        );
        assert_eq!(lunch.marker_emoji, "fork_and_knife");
    }

    #[tokio::test]
    async fn test_parse_delimited_options_and_default_emoji() {
        let catalog = StaticCatalog::parse(SAMPLE, DEFAULT_MARKER_EMOJI).unwrap();
        let standup = catalog.lookup("standup").await.unwrap().unwrap();
        assert_eq!(standup.options, vec!["Monday", "Wednesday", "Friday"]);
        assert_eq!(standup.marker_emoji, DEFAULT_MARKER_EMOJI);
    }

    #[tokio::test]
    async fn test_parse_snake_case_emoji_field() {
        let catalog = StaticCatalog::parse(SAMPLE, DEFAULT_MARKER_EMOJI).unwrap();
        let legacy = catalog.lookup("legacy").await.unwrap().unwrap();
        assert_eq!(legacy.marker_emoji, "thumbsup");
    }

    #[tokio::test]
    async fn test_configured_default_emoji() {
        let catalog = StaticCatalog::parse(SAMPLE, "white_check_mark").unwrap();
        let standup = catalog.lookup("standup").await.unwrap().unwrap();
        assert_eq!(standup.marker_emoji, "white_check_mark");
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let catalog = StaticCatalog::parse(SAMPLE, DEFAULT_MARKER_EMOJI).unwrap();
        assert!(catalog.lookup("dinner").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_names_in_catalog_order() {
        let catalog = StaticCatalog::parse(SAMPLE, DEFAULT_MARKER_EMOJI).unwrap();
        assert_eq!(
            catalog.names().await.unwrap(),
            vec!["lunch", "standup", "legacy"]
        );
    }

    #[test]
    fn test_duplicate_selection_rejected() {
        let raw = r#"[{ selection: "a", options: "x" }, { selection: "a", options: "y" }]"#;
        let err = StaticCatalog::parse(raw, DEFAULT_MARKER_EMOJI).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[test]
    fn test_empty_options_rejected() {
        let raw = r#"[{ selection: "a", options: " , " }]"#;
        let err = StaticCatalog::parse(raw, DEFAULT_MARKER_EMOJI).unwrap_err();
        assert!(err.to_string().contains("has no options"));
    }

    #[test]
    fn test_malformed_catalog() {
        let err = StaticCatalog::parse("{ not a list", DEFAULT_MARKER_EMOJI).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_file_catalog_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json5");
        std::fs::write(&path, r#"[{ selection: "lunch", options: "A, B" }]"#).unwrap();

        let catalog = FileCatalog::new(&path, DEFAULT_MARKER_EMOJI);
        assert_eq!(catalog.names().await.unwrap(), vec!["lunch"]);

        std::fs::write(
            &path,
            r#"[{ selection: "lunch", options: "A, B" }, { selection: "dinner", options: "C" }]"#,
        )
        .unwrap();
        assert!(catalog.lookup("dinner").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_catalog_missing_file() {
        let catalog = FileCatalog::new("/nonexistent/votebot-catalog.json5", DEFAULT_MARKER_EMOJI);
        let err = catalog.lookup("lunch").await.unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
