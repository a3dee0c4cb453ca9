//! Configuration file parser for ~/.config/gitdeck/config.toml.
//!
//! The config file is optional. A missing or empty file yields
//! `Config::default()`. Unknown top-level keys are accepted but logged as
//! warnings, since they are usually typos.
use crate::custom_commands::CustomCommand;
use crate::git::{GitError, PullMode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Keybinding '{name}' must be a string, found {found}")]
    KeybindingNotString { name: String, found: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between automatic refreshes of the files panel. 0 disables.
    pub refresh_interval_secs: u64,

    /// Seconds between background fetches. 0 disables.
    pub fetch_interval_secs: u64,

    /// Focus panels on click and scroll lists with the wheel.
    pub mouse: bool,

    pub git: GitConfig,

    /// Keybinding overrides as nested tables, e.g. `[keybinding.universal] quit = "Q"`.
    pub keybinding: toml::Table,

    pub custom_commands: Vec<CustomCommand>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 10,
            fetch_interval_secs: 60,
            mouse: true,
            git: GitConfig::default(),
            keybinding: toml::Table::new(),
            custom_commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// `merge`, `rebase` or `ff-only`. Checked when a pull starts.
    pub pull_mode: String,

    pub disable_force_pushing: bool,

    /// Push a branch without upstream with `--set-upstream` instead of asking.
    pub push_to_current: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            pull_mode: "merge".to_string(),
            disable_force_pushing: false,
            push_to_current: false,
        }
    }
}

impl GitConfig {
    pub fn pull_mode(&self) -> Result<PullMode, GitError> {
        PullMode::parse(&self.pull_mode)
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "refresh_interval_secs",
        "fetch_interval_secs",
        "mouse",
        "git",
        "keybinding",
        "custom_commands",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            custom_commands = config.custom_commands.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse config text. Empty text yields the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        Ok(toml::from_str(content)?)
    }

    /// Keybinding overrides flattened to dotted logical names
    /// (`universal.quit` → `"Q"`).
    pub fn keybinding_overrides(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let mut out = BTreeMap::new();
        flatten("", &self.keybinding, &mut out)?;
        Ok(out)
    }
}

fn flatten(
    prefix: &str,
    table: &toml::Table,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in table {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::String(s) => {
                out.insert(name, s.clone());
            }
            toml::Value::Table(nested) => flatten(&name, nested, out)?,
            other => {
                return Err(ConfigError::KeybindingNotString {
                    name,
                    found: other.type_str().to_string(),
                })
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.refresh_interval_secs, 10);
        assert_eq!(config.fetch_interval_secs, 60);
        assert!(config.mouse);
        assert_eq!(config.git.pull_mode, "merge");
        assert!(!config.git.disable_force_pushing);
        assert!(config.custom_commands.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/gitdeck_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.refresh_interval_secs, 10);
    }

    #[test]
    fn test_whitespace_only_returns_default() {
        let config = Config::parse("   \n  \n").unwrap();
        assert_eq!(config.fetch_interval_secs, 60);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
refresh_interval_secs = 0
mouse = false

[git]
pull_mode = "rebase"
disable_force_pushing = true

[keybinding.universal]
quit = "Q"
pushFiles = "<c-p>"

[keybinding.files]
commitChanges = "C"

[[custom_commands]]
key = "a"
context = "files"
command = "git add {{.SelectedFile.Name}}"
subprocess = true

[[custom_commands]]
key = "F"
context = "global"
command = "git fetch {{index .PromptResponses 0}}"
[[custom_commands.prompts]]
type = "menu"
title = "Remote"
options = [{ value = "origin" }, { name = "Upstream", value = "upstream" }]
"#;
        let config = Config::parse(content).unwrap();
        assert_eq!(config.refresh_interval_secs, 0);
        assert!(!config.mouse);
        assert_eq!(config.git.pull_mode().unwrap(), PullMode::Rebase);
        assert!(config.git.disable_force_pushing);
        assert!(!config.git.push_to_current);

        let overrides = config.keybinding_overrides().unwrap();
        assert_eq!(overrides.get("universal.quit").map(String::as_str), Some("Q"));
        assert_eq!(
            overrides.get("universal.pushFiles").map(String::as_str),
            Some("<c-p>")
        );
        assert_eq!(overrides.get("files.commitChanges").map(String::as_str), Some("C"));

        assert_eq!(config.custom_commands.len(), 2);
        assert!(config.custom_commands[0].subprocess);
        let prompt = &config.custom_commands[1].prompts[0];
        assert_eq!(prompt.kind, "menu");
        assert_eq!(prompt.options[0].name, "");
        assert_eq!(prompt.options[1].name, "Upstream");
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::parse("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::parse("totally_fake_key = 1\nmouse = false\n").unwrap();
        assert!(!config.mouse);
    }

    #[test]
    fn test_non_string_keybinding_rejected() {
        let config = Config::parse("[keybinding.universal]\nquit = 5\n").unwrap();
        let err = config.keybinding_overrides().unwrap_err();
        assert!(err.to_string().contains("universal.quit"));
    }

    #[test]
    fn test_bad_pull_mode_reported_on_use() {
        let config = Config::parse("[git]\npull_mode = \"squash\"\n").unwrap();
        assert!(config.git.pull_mode().is_err());
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("gitdeck_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join("gitdeck_config_test_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "fetch_interval_secs = 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.fetch_interval_secs, 5);

        std::fs::remove_dir_all(&dir).ok();
    }
}
