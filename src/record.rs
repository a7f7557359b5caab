//! Per-file observations.

use chrono::{DateTime, Local};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// A file as seen at one point in time.
///
/// Records are built fresh on every pass and never cached; sizes and times
/// reflect the moment the file was stat'ed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Base name derived from `path`.
    pub name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
    /// Birth time, when the platform reports one.
    pub created: Option<DateTime<Local>>,
}

impl FileRecord {
    /// Stats `path` (following symlinks) and builds a record.
    pub fn observe(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Self::from_metadata(path, &metadata)
    }

    /// Builds a record from metadata that was already fetched.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> std::io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            name: base_name(path),
            size_bytes: metadata.len(),
            modified: DateTime::<Local>::from(metadata.modified()?),
            created: metadata.created().ok().map(DateTime::<Local>::from),
        })
    }
}

/// Returns the final component of `path` as a string.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
