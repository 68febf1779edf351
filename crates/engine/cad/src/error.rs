//! Error types for the CAD core

use std::path::PathBuf;
use thiserror::Error;

/// Result type for CAD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, saving or configuring a session
///
/// Pointer misses and malformed log lines are not errors: they are reported
/// as [`crate::resolver::ResolveMiss`] and [`crate::project_log::LogLineError`]
/// values and never abort an operation.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML configuration could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// TOML configuration could not be serialized
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Configuration parsed but holds values the session cannot use
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Platform config directory could not be determined
    #[error("Could not determine config directory")]
    NoConfigDir,
}

impl Error {
    /// Wrap an I/O error together with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
