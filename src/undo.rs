//! Reverting the most recent sort of a directory.
//!
//! The sorter records every move in a history log inside the sorted
//! directory. Undo replays that log backwards, moving each file from its
//! category folder back to the root.
use crate::error::{Error, Result};
use crate::paths::require_dir;
use crate::sorter::{Operation, OperationLog};
use std::fs;
use std::path::{Path, PathBuf};

/// What an undo run restored, and what it left alone.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files moved back to where they were.
    pub restored_files: usize,
    /// Files no longer at the location the log recorded.
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Files left in their category folder because the original location is taken.
    pub conflicts: Vec<PathBuf>,
    /// Files whose move back failed, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
}

impl UndoReport {
    pub fn total_processed(&self) -> usize {
        self.restored_files
            + self.skipped_files.len()
            + self.conflicts.len()
            + self.failed_restores.len()
    }

    /// True when some moves were left in the history for a later undo.
    pub fn has_pending(&self) -> bool {
        !self.conflicts.is_empty() || !self.failed_restores.is_empty()
    }

    /// True when every logged move was reverted.
    pub fn is_complete_success(&self) -> bool {
        self.skipped_files.is_empty() && self.conflicts.is_empty() && self.failed_restores.is_empty()
    }
}

enum Restore {
    Done,
    Missing(PathBuf),
    Conflict(PathBuf),
    Failed(PathBuf, String),
}

pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent sort of `base_path`.
    ///
    /// Operations are replayed newest first. A file is never moved over an
    /// existing one: if the original location is taken the file stays in its
    /// category folder and is reported as a conflict. Conflicts and failed
    /// moves stay in the history log so a later undo can retry them; the log
    /// is deleted once nothing is left to retry.
    ///
    /// # Errors
    ///
    /// Fails when `base_path` is not a directory, when it has no history, or
    /// when the history cannot be parsed.
    ///
    /// ```no_run
    /// # fn main() -> filegod::Result<()> {
    /// let report = filegod::UndoManager::undo(std::path::Path::new("Downloads"))?;
    /// assert!(report.is_complete_success());
    /// # Ok(())
    /// # }
    /// ```
    pub fn undo(base_path: &Path) -> Result<UndoReport> {
        require_dir(base_path)?;

        let log = OperationLog::load(base_path)?
            .ok_or_else(|| Error::NoHistory(base_path.to_path_buf()))?;

        let mut report = UndoReport::default();
        let mut pending = Vec::new();
        for operation in log.operations.iter().rev() {
            match Self::restore_file(operation) {
                Restore::Done => report.restored_files += 1,
                Restore::Missing(path) => report
                    .skipped_files
                    .push((path, "file not found at recorded location".to_string())),
                Restore::Conflict(path) => {
                    report.conflicts.push(path);
                    pending.push(operation.clone());
                }
                Restore::Failed(path, reason) => {
                    report.failed_restores.push((path, reason));
                    pending.push(operation.clone());
                }
            }
        }

        if let Err(e) = Self::keep_pending(base_path, log, pending) {
            tracing::warn!(error = %e, "could not update sort history");
        }

        tracing::info!(
            restored = report.restored_files,
            skipped = report.skipped_files.len(),
            conflicts = report.conflicts.len(),
            failed = report.failed_restores.len(),
            "undo complete"
        );
        Ok(report)
    }

    /// Rewrites the history with the operations a later undo can still
    /// revert, or deletes it when there are none. Missing files are dropped.
    fn keep_pending(base_path: &Path, log: OperationLog, mut pending: Vec<Operation>) -> Result<()> {
        if pending.is_empty() {
            return OperationLog::delete(base_path);
        }
        pending.reverse();
        OperationLog {
            operations: pending,
            ..log
        }
        .save(base_path)
    }

    fn restore_file(operation: &Operation) -> Restore {
        if fs::symlink_metadata(&operation.new_path).is_err() {
            return Restore::Missing(operation.new_path.clone());
        }
        if fs::symlink_metadata(&operation.original_path).is_ok() {
            return Restore::Conflict(operation.original_path.clone());
        }

        match fs::rename(&operation.new_path, &operation.original_path) {
            Ok(()) => Restore::Done,
            Err(e) => Restore::Failed(operation.new_path.clone(), e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExcludeRules;
    use crate::pool::{NoProgress, WorkerPool};
    use crate::sorter::{SortOptions, sort_by_type};
    use tempfile::TempDir;

    fn sort(base_path: &Path) {
        sort_by_type(
            base_path,
            &SortOptions::default(),
            &ExcludeRules::none(),
            &WorkerPool::new(2).unwrap(),
            &NoProgress,
        )
        .expect("sort failed");
    }

    #[test]
    fn test_undo_no_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let result = UndoManager::undo(temp_dir.path());
        assert!(matches!(result, Err(Error::NoHistory(_))));
    }

    #[test]
    fn test_undo_restores_sorted_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("image.png"), "image data").unwrap();
        fs::write(base_path.join("script.sh"), "echo hi").unwrap();

        sort(base_path);
        assert!(base_path.join("Images/image.png").exists());

        let report = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(report.restored_files, 2);
        assert!(report.is_complete_success());
        assert!(base_path.join("image.png").exists());
        assert!(base_path.join("script.sh").exists());
        assert!(!OperationLog::history_file_path(base_path).exists());
    }

    #[test]
    fn test_undo_leaves_conflicts_in_place() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("notes.txt"), "original content").unwrap();

        sort(base_path);
        fs::write(base_path.join("notes.txt"), "new content").unwrap();

        let report = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.conflicts, vec![base_path.join("notes.txt")]);
        assert_eq!(
            fs::read_to_string(base_path.join("notes.txt")).unwrap(),
            "new content"
        );
        assert!(base_path.join("Docx/notes.txt").exists());
        assert!(OperationLog::history_file_path(base_path).exists());
    }

    #[test]
    fn test_undo_retry_after_conflict_is_cleared() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("a.png"), "first").unwrap();
        fs::write(base_path.join("b.png"), "second").unwrap();

        sort(base_path);
        fs::write(base_path.join("a.png"), "squatter").unwrap();

        let first = UndoManager::undo(base_path).expect("Undo failed");
        assert_eq!(first.restored_files, 1);
        assert_eq!(first.conflicts, vec![base_path.join("a.png")]);
        assert!(first.has_pending());
        assert!(base_path.join("b.png").exists());

        let log = OperationLog::load(base_path).unwrap().expect("history kept");
        assert_eq!(log.operations.len(), 1);
        assert_eq!(log.operations[0].original_path, base_path.join("a.png"));

        fs::remove_file(base_path.join("a.png")).unwrap();
        let second = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(second.restored_files, 1);
        assert!(second.skipped_files.is_empty());
        assert!(second.is_complete_success());
        assert_eq!(fs::read_to_string(base_path.join("a.png")).unwrap(), "first");
        assert!(!OperationLog::history_file_path(base_path).exists());
    }

    #[test]
    fn test_undo_with_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let operation = Operation {
            original_path: base_path.join("nonexistent.txt"),
            new_path: base_path.join("Docx").join("nonexistent.txt"),
            category: "Docx".to_string(),
        };
        OperationLog::new(base_path.to_path_buf(), vec![operation])
            .save(base_path)
            .expect("Failed to save history");

        let report = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(report.total_processed(), 1);
        assert!(!OperationLog::history_file_path(base_path).exists());
    }

    #[test]
    fn test_undo_rejects_corrupt_history() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(OperationLog::history_file_path(temp_dir.path()), "{not json").unwrap();

        let result = UndoManager::undo(temp_dir.path());
        assert!(matches!(result, Err(Error::InvalidHistory { .. })));
    }

    #[test]
    fn test_undo_invalid_base_path() {
        let result = UndoManager::undo(Path::new("/non/existent/path"));
        assert!(result.is_err());
    }
}
