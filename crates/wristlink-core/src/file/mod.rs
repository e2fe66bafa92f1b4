//! Shared-container enumeration and cleanup.
//!
//! Both endpoints stage outgoing files in a shared container directory.
//! Only a fixed set of extensions takes part in transfers, and the
//! `deleteData` command clears exactly that set. Failures are per-file:
//! one entry that cannot be removed never stops the sweep.

use std::fs;
use std::path::{Path, PathBuf};

use crate::TRANSFERABLE_EXTENSIONS;

/// Whether a path's extension makes it eligible for transfer and cleanup.
#[must_use]
pub fn is_transferable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TRANSFERABLE_EXTENSIONS.contains(&ext))
}

/// Enumerate the transferable files in a directory, sorted by name.
///
/// An unreadable directory yields an empty list; the condition is logged,
/// not raised, matching the command's logged-and-swallowed failure model.
#[must_use]
pub fn transferable_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot enumerate shared container");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_transferable(path))
        .collect();
    files.sort();
    files
}

/// Remove every transferable file from a directory.
///
/// Returns the number of files actually removed. A file that fails to be
/// removed is logged and skipped; the sweep continues.
pub fn remove_transferable_files(dir: &Path) -> usize {
    let mut removed = 0;
    for path in transferable_files(dir) {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "failed to delete file");
            }
        }
    }
    removed
}
