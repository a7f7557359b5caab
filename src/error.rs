//! Error types shared by the engine, the CLI and the shell.
//!
//! Only failures that block a requested operation live here. Per-entry
//! problems during a scan are not errors: they surface as
//! [`Visit::Skipped`](crate::pool::Visit::Skipped) and are dropped.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum Error {
    /// The path given by the user does not exist or cannot be accessed.
    #[error("Path not found: {}", .path.display())]
    PathNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operation needs a directory but got something else.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A date did not have the `dd.mm.yyyy` shape or is not a calendar date.
    #[error("Invalid date '{0}': expected dd.mm.yyyy")]
    InvalidDate(String),

    /// The metadata readers only accept a fixed set of extensions.
    #[error("Unsupported format for {}: expected one of {expected}", .path.display())]
    UnsupportedFormat { path: PathBuf, expected: String },

    /// Any other I/O failure on a specific path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Undo was requested for a directory that has no recorded sort.
    #[error("No previous sort recorded in {}", .0.display())]
    NoHistory(PathBuf),

    /// The history log exists but cannot be read back.
    #[error("Invalid history file {}: {reason}", .path.display())]
    InvalidHistory { path: PathBuf, reason: String },

    /// Reading input or writing output in the interactive shell failed.
    #[error("Terminal I/O failed: {0}")]
    Terminal(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = Error::NotADirectory(PathBuf::from("/tmp/file.txt"));
        assert_eq!(err.to_string(), "Not a directory: /tmp/file.txt");

        let err = Error::InvalidDate("31-12-2024".to_string());
        assert!(err.to_string().contains("dd.mm.yyyy"));
    }
}
