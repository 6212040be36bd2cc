//! Path-related error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// The host operating system has no known server executable.
    #[error("Unsupported operating system: {0}")]
    UnsupportedOs(String),

    /// An empty path was configured.
    #[error("{0} cannot be empty")]
    EmptyPath(&'static str),

    /// A path could not be made absolute.
    #[error("Cannot resolve absolute path for {path}: {reason}")]
    Unresolvable { path: PathBuf, reason: String },
}
