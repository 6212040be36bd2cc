//! Archive extraction into a staging directory.
//!
//! Windows builds and the data set ship as zip; Linux builds ship as
//! `.tar.xz`.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use fxhost_core::UpdateError;
use tracing::debug;

/// Container format, chosen from the archive's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarXz,
}

impl ArchiveFormat {
    pub fn from_path(path: &Path) -> Self {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.ends_with(".tar.xz") {
            Self::TarXz
        } else {
            Self::Zip
        }
    }
}

fn extract_err(archive: &Path, reason: impl ToString) -> UpdateError {
    UpdateError::Extract {
        archive: archive.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Extract every entry of `archive` below `dest`, overwriting existing files.
///
/// Entries whose names would escape `dest` are skipped. Returns the number of
/// files written.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize, UpdateError> {
    fs::create_dir_all(dest)?;
    let format = ArchiveFormat::from_path(archive);
    let written = match format {
        ArchiveFormat::Zip => extract_zip(archive, dest)?,
        ArchiveFormat::TarXz => extract_tar_xz(archive, dest)?,
    };
    debug!(archive = %archive.display(), ?format, files = written, "Extraction complete");
    Ok(written)
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<usize, UpdateError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_err(archive, e))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| extract_err(archive, e))?;
        let Some(relative) = entry.enclosed_name() else {
            debug!(name = entry.name(), "Skipping archive entry outside destination");
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o7777))?;
        }

        written += 1;
    }
    Ok(written)
}

fn extract_tar_xz(archive: &Path, dest: &Path) -> Result<usize, UpdateError> {
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(xz2::read::XzDecoder::new(file));
    tar.set_preserve_permissions(true);
    tar.set_overwrite(true);

    let mut written = 0;
    for entry in tar.entries().map_err(|e| extract_err(archive, e))? {
        let mut entry = entry.map_err(|e| extract_err(archive, e))?;
        let is_file = entry.header().entry_type().is_file();
        // `unpack_in` refuses paths that would land outside `dest`
        if !entry.unpack_in(dest).map_err(|e| extract_err(archive, e))? {
            debug!(name = ?entry.path().ok(), "Skipping archive entry outside destination");
            continue;
        }
        if is_file {
            written += 1;
        }
    }
    Ok(written)
}
