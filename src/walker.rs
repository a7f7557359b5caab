//! Recursive listing of the files under a root directory.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::ExcludeRules;

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Lists every non-hidden file below `root`, at any depth.
///
/// Hidden entries are skipped and hidden directories are not descended
/// into; the root itself is always walked even if its own name starts with
/// a dot. Symlinks are followed; broken links, link cycles and entries that
/// cannot be read are logged and left out, so the result may be partial.
/// Order is unspecified.
pub fn enumerate(root: &Path, excludes: &ExcludeRules) -> Vec<PathBuf> {
    let walker = WalkDir::new(root).follow_links(true);

    let iter = walker.into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        if is_hidden(entry) {
            return false;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        !excludes.is_excluded(relative)
    });

    let mut files = Vec::new();
    for entry_result in iter {
        match entry_result {
            Ok(entry) if entry.file_type().is_dir() => {}
            Ok(entry) => files.push(entry.into_path()),
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry");
            }
        }
    }

    tracing::debug!(root = %root.display(), files = files.len(), "enumerated");
    files
}
