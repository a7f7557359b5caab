//! Sorting the files of one directory into category folders.
//!
//! Only the immediate children of the root are considered. Each file is
//! classified, and moved into `<root>/<Category>/` unless a file with the
//! same name is already there. Moves run concurrently and one failure never
//! stops the others.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ExcludeRules;
use crate::error::{Error, Result};
use crate::file_category::{Category, InstallerHint, classify};
use crate::paths::require_dir;
use crate::pool::{Progress, Visit, WorkerPool};

/// Name of the history log written into the sorted directory.
pub const HISTORY_FILE_NAME: &str = ".filegod_history.json";

/// One file moved (or, in a dry run, planned to be moved) by the sorter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Where the file was before sorting.
    pub original_path: PathBuf,
    /// Where the file is after sorting.
    pub new_path: PathBuf,
    /// Folder name of the category the file was moved to.
    pub category: String,
}

/// Everything one sort run moved, persisted so it can be undone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    /// When the sort ran.
    pub timestamp: DateTime<Local>,
    pub root: PathBuf,
    pub operations: Vec<Operation>,
}

impl OperationLog {
    pub fn new(root: PathBuf, operations: Vec<Operation>) -> Self {
        Self {
            timestamp: Local::now(),
            root,
            operations,
        }
    }

    /// Returns the path of the history file for `root`.
    pub fn history_file_path(root: &Path) -> PathBuf {
        root.join(HISTORY_FILE_NAME)
    }

    /// Writes the log as pretty-printed JSON, replacing any previous one.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = Self::history_file_path(root);
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::InvalidHistory {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| Error::io(path, e))
    }

    /// Loads the log for `root`, or `None` if there is none.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = Self::history_file_path(root);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|e| Error::io(path.clone(), e))?;
        let log = serde_json::from_str(&json).map_err(|e| Error::InvalidHistory {
            path,
            reason: e.to_string(),
        })?;
        Ok(Some(log))
    }

    pub fn delete(root: &Path) -> Result<()> {
        let path = Self::history_file_path(root);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| Error::io(path, e))?;
        }
        Ok(())
    }
}

/// How a sort run behaves.
#[derive(Debug, Clone, Copy)]
pub struct SortOptions {
    /// Report what would happen without creating folders or moving files.
    pub dry_run: bool,
    /// Installer indicator used when classifying.
    pub hint: InstallerHint,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            hint: InstallerHint::InstallOrSetup,
        }
    }
}

/// What a sort run did, file by file.
#[derive(Debug, Clone, Default)]
pub struct SortReport {
    pub dry_run: bool,
    /// Files moved, or planned to be moved in a dry run.
    pub moved: Vec<Operation>,
    /// Files left in place because the destination already exists.
    pub collisions: Vec<(PathBuf, Category)>,
    /// Files no category claims; they stay at the root.
    pub unknown: Vec<PathBuf>,
    /// Files that could not be inspected or moved, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Set when the history log could not be written.
    pub history_warning: Option<String>,
}

/// Outcome for a single child of the root.
enum FileOutcome {
    Moved(Operation),
    Collision(PathBuf, Category),
    Unknown(PathBuf),
    Failed(PathBuf, String),
}

/// Sorts the immediate children of `root` into category folders.
///
/// Category folders are created up front (except in dry runs); creation
/// failures are logged and only surface later as failed moves. Hidden
/// entries, directories and excluded files are left alone. A real run that
/// moved at least one file records its moves in the history log.
///
/// # Errors
///
/// Fails only when `root` is not an accessible directory.
///
/// # Examples
///
/// ```no_run
/// use filegod::config::ExcludeRules;
/// use filegod::pool::{NoProgress, WorkerPool};
/// use filegod::sorter::{sort_by_type, SortOptions};
/// use std::path::Path;
///
/// let pool = WorkerPool::new(4).unwrap();
/// let report = sort_by_type(
///     Path::new("/home/user/Downloads"),
///     &SortOptions::default(),
///     &ExcludeRules::none(),
///     &pool,
///     &NoProgress,
/// )
/// .unwrap();
/// println!("moved {} files", report.moved.len());
/// ```
pub fn sort_by_type(
    root: &Path,
    options: &SortOptions,
    excludes: &ExcludeRules,
    pool: &WorkerPool,
    progress: &dyn Progress,
) -> Result<SortReport> {
    require_dir(root)?;

    if !options.dry_run {
        create_category_dirs(root);
    }

    let children: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| Error::io(root, e))?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| {
            let name = entry.file_name();
            let name = Path::new(&name);
            !name.to_string_lossy().starts_with('.') && !excludes.is_excluded(name)
        })
        .map(|entry| entry.path())
        .collect();

    let outcomes = pool.visit(&children, progress, |path| sort_one(root, path, options));

    let mut report = SortReport {
        dry_run: options.dry_run,
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            FileOutcome::Moved(op) => report.moved.push(op),
            FileOutcome::Collision(path, category) => report.collisions.push((path, category)),
            FileOutcome::Unknown(path) => report.unknown.push(path),
            FileOutcome::Failed(path, reason) => report.failed.push((path, reason)),
        }
    }
    report
        .moved
        .sort_by(|a, b| a.original_path.cmp(&b.original_path));
    report.collisions.sort();
    report.unknown.sort();
    report.failed.sort();

    if !options.dry_run && !report.moved.is_empty() {
        let log = OperationLog::new(root.to_path_buf(), report.moved.clone());
        if let Err(e) = log.save(root) {
            tracing::warn!(error = %e, "could not save sort history");
            report.history_warning = Some(e.to_string());
        }
    }

    tracing::info!(
        moved = report.moved.len(),
        collisions = report.collisions.len(),
        unknown = report.unknown.len(),
        failed = report.failed.len(),
        dry_run = options.dry_run,
        "sort complete"
    );
    Ok(report)
}

/// Creates one folder per sortable category, leaving existing ones alone.
fn create_category_dirs(root: &Path) {
    for category in Category::sortable() {
        let dir = root.join(category.dir_name());
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "could not create category folder");
        }
    }
}

fn sort_one(root: &Path, path: &Path, options: &SortOptions) -> Visit<FileOutcome> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => return Visit::Hit(FileOutcome::Failed(path.to_path_buf(), e.to_string())),
    };
    if metadata.is_dir() {
        return Visit::Miss;
    }

    let category = classify(path, options.hint);
    if category == Category::Other {
        return Visit::Hit(FileOutcome::Unknown(path.to_path_buf()));
    }

    let Some(file_name) = path.file_name() else {
        return Visit::Miss;
    };
    let destination = root.join(category.dir_name()).join(file_name);

    // Never overwrite, even a dangling symlink.
    if fs::symlink_metadata(&destination).is_ok() {
        return Visit::Hit(FileOutcome::Collision(path.to_path_buf(), category));
    }

    let operation = Operation {
        original_path: path.to_path_buf(),
        new_path: destination,
        category: category.dir_name().to_string(),
    };

    if options.dry_run {
        return Visit::Hit(FileOutcome::Moved(operation));
    }

    match fs::rename(&operation.original_path, &operation.new_path) {
        Ok(()) => Visit::Hit(FileOutcome::Moved(operation)),
        Err(e) => Visit::Hit(FileOutcome::Failed(
            operation.original_path,
            format!("could not move to {}/: {}", category.dir_name(), e),
        )),
    }
}
