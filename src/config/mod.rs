//! Typed configuration.
//!
//! Loaded from an optional JSON5 file with environment overrides. Every
//! field has a default, so running without a config file works out of the
//! box. The bot token itself is resolved separately through the
//! credentials provider chain.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Environment variable pointing at an alternative config file.
pub const CONFIG_PATH_ENV_VAR: &str = "HUDDLE_CONFIG";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub slack: SlackSettings,
    pub poll: PollSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackSettings {
    /// Bot token (`xoxb-…`). Usually left unset in favour of the
    /// `SLACK_BOT_TOKEN` env var or the OS keyring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Channel used when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollSettings {
    pub reactions: VoteReactions,

    /// How far back discovery-mode tallying scans channel history, in
    /// hours.
    pub lookback_hours: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            reactions: VoteReactions::default(),
            lookback_hours: 72,
        }
    }
}

/// The two fixed reaction names used as vote signals. These are
/// configuration constants, not per-poll data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoteReactions {
    /// Reaction the bot pre-attaches for "available".
    pub affirmative: String,

    /// Reaction the bot pre-attaches for "unavailable".
    pub negative: String,

    /// Extra names counted as affirmative when reading votes.
    pub affirmative_aliases: Vec<String>,

    /// Extra names counted as negative when reading votes.
    pub negative_aliases: Vec<String>,
}

impl Default for VoteReactions {
    fn default() -> Self {
        Self {
            affirmative: "white_check_mark".to_string(),
            negative: "x".to_string(),
            affirmative_aliases: vec!["heavy_check_mark".to_string()],
            negative_aliases: vec!["negative_squared_cross_mark".to_string()],
        }
    }
}

impl VoteReactions {
    pub fn is_affirmative(&self, name: &str) -> bool {
        self.affirmative == name || self.affirmative_aliases.iter().any(|a| a == name)
    }

    pub fn is_negative(&self, name: &str) -> bool {
        self.negative == name || self.negative_aliases.iter().any(|a| a == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// SQLite database path. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Resolved database path, falling back to the platform default.
    pub fn db_path(&self) -> PathBuf {
        self.store.db_path.clone().unwrap_or_else(default_db_path)
    }
}

/// Resolved config file location: `$HUDDLE_CONFIG`, else
/// `<config dir>/huddle/config.json5`.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("huddle")
        .join("config.json5")
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("huddle")
        .join("huddle.db")
}

/// Load configuration from the default location plus env overrides. A
/// missing file yields the defaults; a malformed file is a configuration
/// error, not a silent fallback.
pub fn load() -> Result<Config, Error> {
    let mut config = load_from(&config_path())?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load configuration from an explicit file path (no env overrides).
pub fn load_from(path: &Path) -> Result<Config, Error> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!("failed to read {}: {}", path.display(), e))
    })?;
    json5::from_str(&raw).map_err(|e| {
        Error::Configuration(format!("failed to parse {}: {}", path.display(), e))
    })
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(channel) = std::env::var("HUDDLE_DEFAULT_CHANNEL") {
        if !channel.is_empty() {
            config.slack.default_channel = Some(channel);
        }
    }
    if let Ok(db) = std::env::var("HUDDLE_DB") {
        if !db.is_empty() {
            config.store.db_path = Some(PathBuf::from(db));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.poll.lookback_hours, 72);
        assert_eq!(config.poll.reactions.affirmative, "white_check_mark");
        assert_eq!(config.poll.reactions.negative, "x");
        assert!(config.slack.default_channel.is_none());
    }

    #[test]
    fn test_reaction_matching_with_aliases() {
        let reactions = VoteReactions::default();
        assert!(reactions.is_affirmative("white_check_mark"));
        assert!(reactions.is_affirmative("heavy_check_mark"));
        assert!(reactions.is_negative("x"));
        assert!(reactions.is_negative("negative_squared_cross_mark"));
        assert!(!reactions.is_affirmative("x"));
        assert!(!reactions.is_negative("thumbsup"));
    }

    #[test]
    fn test_load_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("absent.json5")).unwrap();
        assert_eq!(config.poll.lookback_hours, 72);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json5");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                // local overrides
                slack: {{ defaultChannel: "C0123ABCD" }},
                poll: {{ lookbackHours: 12 }},
            }}"#
        )
        .unwrap();

        let config = load_from(&path).unwrap();
        assert_eq!(config.slack.default_channel.as_deref(), Some("C0123ABCD"));
        assert_eq!(config.poll.lookback_hours, 12);
        // Untouched sections keep their defaults.
        assert_eq!(config.poll.reactions.negative, "x");
    }

    #[test]
    fn test_load_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json5");
        std::fs::write(&path, "{ slack: ").unwrap();
        assert!(load_from(&path).is_err());
    }
}
