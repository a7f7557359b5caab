//! Per-category statistics for a directory tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::file_category::{Category, InstallerHint, classify};
use crate::pool::{Progress, Visit, WorkerPool};

/// File count and byte total of one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub files: usize,
    pub bytes: u64,
}

/// Result of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub total_files: usize,
    pub total_bytes: u64,
    /// Every category, including empty ones.
    pub categories: BTreeMap<Category, CategoryStats>,
}

impl AnalysisSummary {
    fn new() -> Self {
        Self {
            total_files: 0,
            total_bytes: 0,
            categories: Category::ALL
                .iter()
                .map(|c| (*c, CategoryStats::default()))
                .collect(),
        }
    }

    fn add(&mut self, category: Category, bytes: u64) {
        self.total_files += 1;
        self.total_bytes += bytes;
        let stats = self.categories.entry(category).or_default();
        stats.files += 1;
        stats.bytes += bytes;
    }

    pub fn stats(&self, category: Category) -> CategoryStats {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    /// Non-empty categories, most files first.
    pub fn by_count(&self) -> Vec<(Category, CategoryStats)> {
        let mut rows: Vec<_> = self
            .categories
            .iter()
            .filter(|(_, stats)| stats.files > 0)
            .map(|(c, stats)| (*c, *stats))
            .collect();
        rows.sort_by(|a, b| b.1.files.cmp(&a.1.files).then(a.0.cmp(&b.0)));
        rows
    }

    /// Categories holding bytes, largest first, with their share in percent.
    pub fn by_size(&self) -> Vec<(Category, u64, f64)> {
        let mut rows: Vec<_> = self
            .categories
            .iter()
            .filter(|(_, stats)| stats.bytes > 0)
            .map(|(c, stats)| (*c, stats.bytes, self.share(stats.bytes)))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        rows
    }

    fn share(&self, bytes: u64) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            bytes as f64 / self.total_bytes as f64 * 100.0
        }
    }
}

/// Classifies and sizes every regular file in `paths`.
///
/// Classification uses [`InstallerHint::Install`]. Files that cannot be
/// stat'ed are left out of the totals.
pub fn analyze(paths: &[PathBuf], pool: &WorkerPool, progress: &dyn Progress) -> AnalysisSummary {
    let observed = pool.visit(paths, progress, |path| match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => {
            Visit::Hit((classify(path, InstallerHint::Install), metadata.len()))
        }
        Ok(_) => Visit::Miss,
        Err(e) => Visit::skipped(path, e),
    });

    let mut summary = AnalysisSummary::new();
    for (category, bytes) in observed {
        summary.add(category, bytes);
    }

    tracing::info!(
        files = summary.total_files,
        bytes = summary.total_bytes,
        "analysis complete"
    );
    summary
}
