//! Staging → destination merge.
//!
//! All directories are created first, then every file is moved into place,
//! deleting any file already at the destination. The merge as a whole is not
//! atomic: an interrupted merge leaves a mix of old and new files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fxhost_core::UpdateError;
use tracing::debug;

/// Counts of what a merge touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub directories: usize,
    pub files: usize,
}

/// Move the tree under `source` into `dest`.
pub fn merge_tree(source: &Path, dest: &Path) -> Result<MergeSummary, UpdateError> {
    let merge_err = |e: io::Error| UpdateError::Merge {
        from: source.to_path_buf(),
        to: dest.to_path_buf(),
        reason: e.to_string(),
    };

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    collect(source, Path::new(""), &mut dirs, &mut files).map_err(merge_err)?;

    fs::create_dir_all(dest).map_err(merge_err)?;
    for dir in &dirs {
        fs::create_dir_all(dest.join(dir)).map_err(merge_err)?;
    }

    for file in &files {
        let from = source.join(file);
        let to = dest.join(file);
        if to.exists() {
            fs::remove_file(&to).map_err(merge_err)?;
        }
        move_file(&from, &to).map_err(merge_err)?;
    }

    debug!(
        from = %source.display(),
        to = %dest.display(),
        directories = dirs.len(),
        files = files.len(),
        "Merged staging tree"
    );
    Ok(MergeSummary {
        directories: dirs.len(),
        files: files.len(),
    })
}

/// Relative paths of every directory and file below `root`.
fn collect(
    root: &Path,
    relative: &Path,
    dirs: &mut Vec<PathBuf>,
    files: &mut Vec<PathBuf>,
) -> io::Result<()> {
    for entry in fs::read_dir(root.join(relative))? {
        let entry = entry?;
        let path = relative.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            dirs.push(path.clone());
            collect(root, &path, dirs, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Rename, falling back to copy + delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}
