//! Configuration loading from blockgate.toml.

use host::FixedAuthorizer;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite site database.
    pub database: PathBuf,

    /// Tracing filter used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// The acting user.
    pub user: UserConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("site.db"),
            log_filter: "info".to_string(),
            user: UserConfig::default(),
        }
    }
}

/// Capabilities of the user running the CLI.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct UserConfig {
    /// Whether locking rules are ignored for this user.
    pub bypass_locking: bool,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn authorizer(&self) -> FixedAuthorizer {
        FixedAuthorizer::new(self.user.bypass_locking)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}
