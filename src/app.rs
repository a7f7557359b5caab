//! Running user-level operations.
//!
//! Both the one-shot subcommands and the interactive shell reduce a request
//! to an [`Action`]; [`App::run`] performs it with the configured pool,
//! exclusion rules and formatter, and returns the rendered result.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::analysis::analyze;
use crate::config::{ExcludeRules, Settings};
use crate::error::Result;
use crate::filter::{FilterCriteria, filter_files};
use crate::metadata::{read_exif, read_mp3_tags};
use crate::output::OutputFormatter;
use crate::paths::require_dir;
use crate::pool::{NoProgress, Progress, WorkerPool};
use crate::record::FileRecord;
use crate::search::{search_content, search_names};
use crate::sorter::{SortOptions, sort_by_type};
use crate::undo::UndoManager;
use crate::walker::enumerate;

/// One operation a user can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Sort { root: PathBuf, dry_run: bool },
    Undo { root: PathBuf },
    Analyze { root: PathBuf },
    FindNames { root: PathBuf, query: String },
    SearchContent { root: PathBuf, query: String },
    Filter { root: PathBuf, criteria: FilterCriteria },
    Exif { path: PathBuf },
    Mp3 { path: PathBuf },
}

impl Action {
    /// Label for the progress bar of actions that run on the worker pool.
    /// Single-file and undo actions report no progress.
    fn progress_label(&self) -> Option<&'static str> {
        match self {
            Action::Sort { .. } => Some("sorting"),
            Action::Analyze { .. } => Some("analyzing"),
            Action::FindNames { .. } => Some("matching names"),
            Action::SearchContent { .. } => Some("searching contents"),
            Action::Filter { .. } => Some("filtering"),
            Action::Undo { .. } | Action::Exif { .. } | Action::Mp3 { .. } => None,
        }
    }
}

/// Shared state for running actions.
pub struct App {
    pool: WorkerPool,
    excludes: ExcludeRules,
    formatter: OutputFormatter,
    show_progress: bool,
}

impl App {
    /// Builds the pool and compiles exclusion rules from `settings`.
    pub fn new(settings: &Settings, formatter: OutputFormatter) -> Result<Self> {
        let pool = WorkerPool::new(settings.scan.workers)?;
        let excludes = settings.exclude_rules()?;
        tracing::debug!(workers = pool.workers(), "worker pool ready");

        Ok(Self {
            pool,
            excludes,
            formatter,
            show_progress: std::io::stderr().is_terminal(),
        })
    }

    /// Disables progress bars, e.g. for tests or piped output.
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn formatter(&self) -> &OutputFormatter {
        &self.formatter
    }

    /// Performs `action` and returns its rendered report.
    pub fn run(&self, action: &Action) -> Result<String> {
        tracing::info!(?action, "running");

        let bar = action
            .progress_label()
            .filter(|_| self.show_progress)
            .map(|label| self.formatter.progress_bar(label));
        let progress: &dyn Progress = match &bar {
            Some(bar) => bar,
            None => &NoProgress,
        };

        let result = self.perform(action, progress);
        progress.finish();
        result
    }

    fn perform(&self, action: &Action, progress: &dyn Progress) -> Result<String> {
        match action {
            Action::Sort { root, dry_run } => {
                let options = SortOptions {
                    dry_run: *dry_run,
                    ..Default::default()
                };
                let report = sort_by_type(root, &options, &self.excludes, &self.pool, progress)?;
                Ok(self.formatter.sort_report(&report, root))
            }
            Action::Undo { root } => {
                let report = UndoManager::undo(root)?;
                Ok(self.formatter.undo_report(&report))
            }
            Action::Analyze { root } => {
                let files = self.files_under(root)?;
                let summary = analyze(&files, &self.pool, progress);
                Ok(self.formatter.analysis(&summary, root))
            }
            Action::FindNames { root, query } => {
                let files = self.files_under(root)?;
                let mut found = search_names(&files, query, &self.pool, progress);
                sort_records(&mut found);
                Ok(self.formatter.name_results(&found, query))
            }
            Action::SearchContent { root, query } => {
                let files = self.files_under(root)?;
                let mut hits = search_content(&files, query, &self.pool, progress);
                hits.sort_by(|a, b| a.record.path.cmp(&b.record.path));
                Ok(self.formatter.content_results(&hits, query))
            }
            Action::Filter { root, criteria } => {
                let files = self.files_under(root)?;
                let mut matched = filter_files(&files, criteria, &self.pool, progress);
                sort_records(&mut matched);
                Ok(self.formatter.filter_results(&matched, criteria))
            }
            Action::Exif { path } => Ok(self.formatter.exif(&read_exif(path)?)),
            Action::Mp3 { path } => Ok(self.formatter.mp3(&read_mp3_tags(path)?)),
        }
    }

    fn files_under(&self, root: &Path) -> Result<Vec<PathBuf>> {
        require_dir(root)?;
        Ok(enumerate(root, &self.excludes))
    }
}

fn sort_records(records: &mut [FileRecord]) {
    records.sort_by(|a, b| a.path.cmp(&b.path));
}
