//! Filesystem layout of one server installation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::SupportedOs;
use crate::release::ReleaseDescriptor;

/// Runtime support directory under the game path, passed as `citizen_dir`.
pub const CITIZEN_DIR: &str = "Citizen";

/// Server data directory name, both under the game path and in staging.
pub const SERVER_DATA_DIR: &str = "server-data";

/// Install, staging and data roots.
///
/// The update pipeline only writes below `updates_path`; content reaches
/// `game_path` and `data_path` exclusively through a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationLayout {
    /// Install root containing the server executable
    pub game_path: PathBuf,
    /// Staging root for downloads and extracted archives
    pub updates_path: PathBuf,
    /// Server data root (resources, server.cfg)
    pub data_path: PathBuf,
}

impl InstallationLayout {
    pub fn new(
        game_path: impl Into<PathBuf>,
        updates_path: impl Into<PathBuf>,
        data_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            game_path: game_path.into(),
            updates_path: updates_path.into(),
            data_path: data_path.into(),
        }
    }

    /// Path of the server executable for `os`.
    pub fn executable(&self, os: SupportedOs) -> PathBuf {
        self.game_path.join(os.executable())
    }

    /// Working directory of the server process.
    pub fn working_dir(&self) -> PathBuf {
        self.game_path.join(SERVER_DATA_DIR)
    }

    /// Absolute path of the runtime support directory.
    ///
    /// The directory does not need to exist yet.
    pub fn citizen_dir(&self) -> Result<PathBuf, PathError> {
        let relative = self.game_path.join(CITIZEN_DIR);
        std::path::absolute(&relative).map_err(|e| PathError::Unresolvable {
            path: relative,
            reason: e.to_string(),
        })
    }

    pub fn is_installed(&self, os: SupportedOs) -> bool {
        self.executable(os).is_file()
    }

    pub fn is_data_path_valid(&self) -> bool {
        self.working_dir().is_dir()
    }

    /// Download target for a release archive, keeping the extension(s) of
    /// `archive_name` (`server.zip` → `<version>.zip`).
    pub fn release_archive(&self, release: &ReleaseDescriptor, archive_name: &str) -> PathBuf {
        let extension = archive_name
            .split_once('.')
            .map_or("zip", |(_, ext)| ext);
        self.updates_path
            .join(format!("{}.{extension}", release.version_name()))
    }

    /// Extraction directory for a release archive.
    pub fn release_staging_dir(&self, release: &ReleaseDescriptor) -> PathBuf {
        self.updates_path.join(release.version_name())
    }

    /// Download target for the data-set archive.
    pub fn data_archive(&self) -> PathBuf {
        self.updates_path.join(format!("{SERVER_DATA_DIR}.zip"))
    }

    /// Extraction directory for the data-set archive.
    pub fn data_staging_dir(&self) -> PathBuf {
        self.updates_path.join(SERVER_DATA_DIR)
    }

    /// Check that no root is empty.
    pub fn validate(&self) -> Result<(), PathError> {
        for (name, path) in [
            ("game_path", &self.game_path),
            ("updates_path", &self.updates_path),
            ("data_path", &self.data_path),
        ] {
            if is_blank(path) {
                return Err(PathError::EmptyPath(name));
            }
        }
        Ok(())
    }
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}
