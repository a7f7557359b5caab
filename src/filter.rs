//! Multi-criteria file filtering.
//!
//! Criteria are checked cheapest first so that most files are rejected on
//! metadata alone: modification date, then file name, then contents. The
//! first failing check ends the evaluation of that file.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::file_category::is_text_file;
use crate::pool::{Progress, Visit, WorkerPool};
use crate::record::{FileRecord, base_name};
use crate::search::fold_case;

/// Files above this size are never read for content matching.
pub const MAX_CONTENT_BYTES: u64 = 10 * 1024 * 1024;

/// Constraints a file must satisfy. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Earliest modification day, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Latest modification day, inclusive.
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive substring of the base name.
    pub name_contains: Option<String>,
    /// Case-insensitive substring of the file's text.
    pub content_contains: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modified_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Sets the name filter; an empty string clears it.
    pub fn name_contains(mut self, query: impl Into<String>) -> Self {
        self.name_contains = non_empty(query.into());
        self
    }

    /// Sets the content filter; an empty string clears it.
    pub fn content_contains(mut self, query: impl Into<String>) -> Self {
        self.content_contains = non_empty(query.into());
        self
    }

    /// True when no field is set, so every regular file passes.
    pub fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.name_contains.is_none()
            && self.content_contains.is_none()
    }

    fn date_matches(&self, day: NaiveDate) -> bool {
        self.date_from.is_none_or(|from| day >= from) && self.date_to.is_none_or(|to| day <= to)
    }
}

fn non_empty(query: String) -> Option<String> {
    if query.is_empty() { None } else { Some(query) }
}

/// Returns the regular files among `paths` that satisfy every set criterion.
///
/// Files are evaluated independently on `pool`; the order of the result is
/// unspecified. Files that vanish or cannot be stat'ed are dropped.
pub fn filter_files(
    paths: &[PathBuf],
    criteria: &FilterCriteria,
    pool: &WorkerPool,
    progress: &dyn Progress,
) -> Vec<FileRecord> {
    let name_query = criteria.name_contains.as_deref().map(fold_case);
    let content_query = criteria.content_contains.as_deref().map(fold_case);

    let matched = pool.visit(paths, progress, |path| {
        evaluate(path, criteria, name_query.as_deref(), content_query.as_deref())
    });

    tracing::info!(
        total = paths.len(),
        matched = matched.len(),
        "filter pass complete"
    );
    matched
}

/// Runs the short-circuit chain on one file.
///
/// `name_query` and `content_query` are the case-folded criteria.
fn evaluate(
    path: &Path,
    criteria: &FilterCriteria,
    name_query: Option<&str>,
    content_query: Option<&str>,
) -> Visit<FileRecord> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => return Visit::skipped(path, e),
    };
    if !metadata.is_file() {
        return Visit::Miss;
    }

    let record = match FileRecord::from_metadata(path, &metadata) {
        Ok(record) => record,
        Err(e) => return Visit::skipped(path, e),
    };

    if !criteria.date_matches(record.modified.date_naive()) {
        return Visit::Miss;
    }

    if let Some(query) = name_query
        && !fold_case(&base_name(path)).contains(query)
    {
        return Visit::Miss;
    }

    if let Some(query) = content_query {
        if !is_text_file(path) || record.size_bytes > MAX_CONTENT_BYTES {
            return Visit::Miss;
        }
        match fs::read_to_string(path) {
            Ok(content) if fold_case(&content).contains(query) => {}
            Ok(_) => return Visit::Miss,
            // Undecodable or unreadable content cannot satisfy the filter.
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "content unreadable");
                return Visit::Miss;
            }
        }
    }

    Visit::Hit(record)
}
