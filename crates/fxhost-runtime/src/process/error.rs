use std::path::PathBuf;

use fxhost_core::PathError;
use thiserror::Error;

/// Errors raised while launching the server process.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Server executable not found at {0}")]
    ExecutableMissing(PathBuf),

    #[error("Failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Spawned process has no PID")]
    NoPid,

    #[error(transparent)]
    Path(#[from] PathError),
}
