//! Install/update port used by the supervisor.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the update pipeline.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Failed to fetch release index {url}: {reason}")]
    Index { url: String, reason: String },

    #[error("No releases found in the index")]
    NoReleases,

    #[error("Download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to extract {archive}: {reason}")]
    Extract { archive: PathBuf, reason: String },

    #[error("Failed to merge {from} into {to}: {reason}")]
    Merge {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stage-then-merge installer for server binaries and the data set.
#[async_trait]
pub trait Updater: Send + Sync {
    /// Install the most recent server build into the game path.
    async fn update_binaries(&self) -> Result<(), UpdateError>;

    /// Install the baseline data set into the data path.
    ///
    /// Does nothing when the data set is already staged.
    async fn update_data(&self) -> Result<(), UpdateError>;
}
