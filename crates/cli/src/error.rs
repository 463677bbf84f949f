//! CLI error types.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The database file does not exist.
    ///
    /// This typically means the site has not been initialised yet.
    #[error("database not found at {path}. Run 'blockgate init' first")]
    DatabaseNotFound { path: PathBuf },

    /// A setup file had no content.
    #[error("the file {path} is empty")]
    EmptyFile { path: PathBuf },

    /// No category has the given id.
    #[error("category {0} not found")]
    CategoryNotFound(host::CategoryId),

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Host(#[from] host::Error),

    #[error(transparent)]
    Storage(#[from] storage::Error),

    #[error(transparent)]
    Policy(#[from] policy::Error),

    #[error(transparent)]
    Setup(#[from] setup::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
