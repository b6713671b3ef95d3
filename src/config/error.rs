//! Configuration error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, linting or persisting a config section.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Backing file does not exist.
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// File content is not valid JSON.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading the file failed for a reason other than absence.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    /// True when the error means the backing file is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }
}
