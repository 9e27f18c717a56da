//! Error types for configuration loading and the logging pipeline.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A configuration source exists but could not be read or parsed.
    /// Missing sources are skipped and never produce this error.
    #[error("failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// The `logging` section of the merged configuration is invalid.
    #[error("invalid logging configuration: {0}")]
    InvalidConfig(String),

    /// The log directory could not be created.
    #[error("failed to create log directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log file could not be opened.
    #[error("failed to open log file {path}")]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renaming or removing a file during size-based rotation failed. The
    /// triggering record has not been written when this is returned.
    #[error("failed to rotate log file {path}")]
    Rotation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a formatted record to a handler failed.
    #[error("failed to write log record")]
    Write(#[from] std::io::Error),

    /// The background listener thread could not be spawned.
    #[error("failed to start log listener thread")]
    Listener(#[source] std::io::Error),
}
