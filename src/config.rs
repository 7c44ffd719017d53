//! Configuration loading
//!
//! The config lives at `$XDG_CONFIG_HOME/spotiload/config.json` (falling back
//! to `~/.config`). The same application directory hosts the completion
//! ledger database.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application subdirectory under the config home.
pub const APP_DIR: &str = "spotiload";

const CONFIG_FILE: &str = "config.json";

/// Default output filename template.
pub const DEFAULT_TEMPLATE: &str = "{artist} - {song_name}.{ext}";

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub username: String,
    pub password: String,
    pub output: String,
    /// Discord webhook URL. When absent, no notifications are sent.
    pub discord: Option<String>,
    template: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    username: Option<String>,
    password: Option<String>,
    output: Option<String>,
    #[serde(default)]
    discord: Option<String>,
    #[serde(default)]
    template: Option<String>,
}

impl Config {
    /// Load from the default location under the config home.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&app_dir()?.join(CONFIG_FILE))
    }

    /// Load and validate a config file at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let raw: RawConfig = serde_json::from_str(&contents).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            username: required(raw.username, "username")?,
            password: required(raw.password, "password")?,
            output: required(raw.output, "output")?,
            discord: raw.discord.filter(|url| !url.trim().is_empty()),
            template: raw.template,
        })
    }

    /// Download directory with the `~/` shorthand expanded.
    pub fn output_dir(&self) -> Result<PathBuf, ConfigError> {
        expand_tilde(&self.output)
    }

    /// Output filename template.
    pub fn template(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingKey(key)),
    }
}

/// Resolve the config home: `$XDG_CONFIG_HOME`, else `~/.config`.
pub fn config_home() -> Result<PathBuf, ConfigError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .ok_or(ConfigError::NoHome)
}

/// Application config directory (config file and ledger database).
pub fn app_dir() -> Result<PathBuf, ConfigError> {
    Ok(config_home()?.join(APP_DIR))
}

fn expand_tilde(path: &str) -> Result<PathBuf, ConfigError> {
    if path == "~" {
        return dirs::home_dir().ok_or(ConfigError::NoHome);
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return Ok(dirs::home_dir().ok_or(ConfigError::NoHome)?.join(rest));
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"username": "u", "password": "p", "output": "/music", "discord": "https://example.com/hook"}"#,
        );

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.username, "u");
        assert_eq!(config.output, "/music");
        assert_eq!(config.discord.as_deref(), Some("https://example.com/hook"));
        assert_eq!(config.template(), DEFAULT_TEMPLATE);
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"username": "u", "password": "p", "output": ""}"#);

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("output")));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "{not json");

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn absent_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn absent_discord_disables_notifications() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"username": "u", "password": "p", "output": "/music"}"#);

        let config = Config::load_from(&path).unwrap();
        assert!(config.discord.is_none());
    }
}
