//! Configuration management for the portal client.
//!
//! Loads configuration from ${ENGPORTAL_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Env var that overrides `base_url` (handy for pointing at a mock server).
pub const BASE_URL_ENV: &str = "ENGPORTAL_BASE_URL";
/// Env var that overrides `health_url`.
pub const HEALTH_URL_ENV: &str = "ENGPORTAL_HEALTH_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// This ensures new comments/sections from the template are always present,
/// while preserving user's customized values.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for configuration and session data.
    //!
    //! ENGPORTAL_HOME resolution order:
    //! 1. ENGPORTAL_HOME environment variable (if set)
    //! 2. ~/.config/engportal (default)
    //! 3. ./.engportal when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the portal home directory.
    pub fn portal_home() -> PathBuf {
        if let Ok(home) = std::env::var("ENGPORTAL_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".engportal"),
            |h| h.join(".config").join("engportal"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        portal_home().join("config.toml")
    }

    /// Returns the path to the persisted session.
    pub fn session_path() -> PathBuf {
        portal_home().join("session.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin plus path prefix for all API calls
    pub base_url: String,

    /// Liveness endpoint, outside the API prefix
    pub health_url: String,

    /// Timeout for data calls in milliseconds
    pub timeout_ms: u64,

    /// Timeout for the reachability probe in milliseconds
    pub probe_timeout_ms: u64,
}

impl Config {
    pub const DEFAULT_BASE_URL: &'static str = "https://alemam-backend.vercel.app/api";
    pub const DEFAULT_HEALTH_URL: &'static str = "https://alemam-backend.vercel.app/health";
    const DEFAULT_TIMEOUT_MS: u64 = 15_000;
    const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;

    /// Loads configuration from the default config path, then applies env overrides.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&paths::config_path())?;
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Applies non-empty overrides for the URLs from `lookup`.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(base_url) = non_empty(BASE_URL_ENV) {
            self.base_url = base_url;
        }
        if let Some(health_url) = non_empty(HEALTH_URL_ENV) {
            self.health_url = health_url;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Saves only the base_url field to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or written.
    pub fn save_base_url_to(path: &Path, base_url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["base_url"] = value(base_url.trim_end_matches('/'));

        Self::write_config(path, &doc.to_string())
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            health_url: Self::DEFAULT_HEALTH_URL.to_string(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            probe_timeout_ms: Self::DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}
