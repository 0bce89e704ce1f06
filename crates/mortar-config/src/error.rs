//! Error types for configuration loading.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file exists but could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unknown plugin `{name}`")]
    UnknownPlugin { name: String },

    #[error("invalid options for plugin `{plugin}`: {message}")]
    InvalidPluginOptions { plugin: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
