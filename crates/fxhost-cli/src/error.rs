//! CLI error type and exit codes.

use fxhost_core::{PathError, SettingsError, UpdateError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Settings could not be loaded, validated or written.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The host platform or install layout is unusable.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Downloading or installing server files failed.
    #[error("Update failed: {0}")]
    Update(String),

    /// A supervisor operation was refused.
    #[error("{0}")]
    Action(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Map error to an exit code (see sysexits.h).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Platform(_) => 69, // EX_UNAVAILABLE
            Self::Update(_) => 75,   // EX_TEMPFAIL
            Self::Action(_) => 1,
            Self::Io(_) => 74, // EX_IOERR
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Platform(err.to_string())
    }
}

impl From<UpdateError> for CliError {
    fn from(err: UpdateError) -> Self {
        Self::Update(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
