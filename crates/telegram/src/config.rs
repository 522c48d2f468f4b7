use std::path::Path;

use {
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{Error, Result};

/// Where media groups are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Process memory. Groups are lost on restart.
    #[default]
    Memory,
    /// SQLite database at `database_url`.
    Sqlite,
}

/// Media group storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MediaGroupsConfig {
    pub backend: BackendKind,

    /// sqlx connection URL, only used by the sqlite backend.
    pub database_url: String,

    /// Prepended to every storage key, e.g. to share one database between bots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
}

impl Default for MediaGroupsConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            database_url: "sqlite://media_groups.db?mode=rwc".into(),
            key_prefix: None,
        }
    }
}

/// Load config from a TOML file, or JSON when the extension is `.json`.
pub fn load_config(path: &Path) -> Result<MediaGroupsConfig> {
    let raw = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), "loading media group config");
    parse_config(&raw, path)
}

fn parse_config(raw: &str, path: &Path) -> Result<MediaGroupsConfig> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(raw).map_err(|e| Error::config(path.display().to_string(), e))
    } else {
        toml::from_str(raw).map_err(|e| Error::config(path.display().to_string(), e))
    }
}
