//! Supported host platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::error::PathError;

/// Operating systems FXServer artifacts are published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedOs {
    Windows,
    Linux,
}

impl SupportedOs {
    /// Every supported platform. The executable mapping below is an
    /// exhaustive `match`, so adding a variant without a path fails to compile.
    pub const ALL: [Self; 2] = [Self::Windows, Self::Linux];

    /// Detect the platform this binary was compiled for.
    pub fn current() -> Result<Self, PathError> {
        if cfg!(target_os = "windows") {
            Ok(Self::Windows)
        } else if cfg!(target_os = "linux") {
            Ok(Self::Linux)
        } else {
            Err(PathError::UnsupportedOs(std::env::consts::OS.to_string()))
        }
    }

    /// Artifact index listing server builds for this platform.
    pub const fn artifact_index(self) -> &'static str {
        match self {
            Self::Windows => "https://runtime.fivem.net/artifacts/fivem/build_server_windows/master/",
            Self::Linux => "https://runtime.fivem.net/artifacts/fivem/build_proot_linux/master/",
        }
    }

    /// Server archive name inside each build directory.
    pub const fn server_archive(self) -> &'static str {
        match self {
            Self::Windows => "server.zip",
            Self::Linux => "fx.tar.xz",
        }
    }

    /// Server executable relative to the game path.
    pub fn executable(self) -> &'static Path {
        match self {
            Self::Windows => Path::new("FXServer.exe"),
            Self::Linux => Path::new("run.sh"),
        }
    }
}

impl fmt::Display for SupportedOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => f.write_str("windows"),
            Self::Linux => f.write_str("linux"),
        }
    }
}
