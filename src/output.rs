//! Output formatting and styling module.
//!
//! Everything the user sees is laid out here: boxed containers centered in
//! the terminal, centered notices, progress bars and one renderer per kind of
//! result. Renderers return strings so the same text serves the shell, the
//! one-shot commands and the tests.

use colored::*;
use crossterm::terminal;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use crate::analysis::AnalysisSummary;
use crate::filter::FilterCriteria;
use crate::format::{format_date, format_file_size, format_timestamp};
use crate::metadata::{ExifReport, Mp3Report};
use crate::record::FileRecord;
use crate::search::ContentHit;
use crate::sorter::SortReport;
use crate::undo::UndoReport;

/// Widest a container gets, borders included.
pub const MAX_CONTAINER_WIDTH: usize = 80;

const DEFAULT_TERMINAL_WIDTH: usize = 80;
const MIN_CONTAINER_WIDTH: usize = 20;

const BANNER: &str = "\
 ___ _ _         ___         _
| __(_) |___ ___/ __|___  __| |
| _|| | / -_)___| (_ / _ \\/ _` |
|_| |_|_\\___|    \\___\\___/\\__,_|";

/// Renders results as centered, red-bordered containers.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    terminal_width: usize,
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(terminal_width())
    }
}

/// Current width of the attached terminal, or 80 when there is none.
pub fn terminal_width() -> usize {
    terminal::size()
        .ok()
        .map(|(columns, _)| usize::from(columns))
        .filter(|&width| width > 0)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}

/// Turns ANSI colors off (or back on) for every formatter.
pub fn set_color(enabled: bool) {
    colored::control::set_override(enabled);
}

fn text_width(text: &str) -> usize {
    text.chars().count()
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

impl OutputFormatter {
    pub fn new(terminal_width: usize) -> Self {
        Self { terminal_width }
    }

    fn container_width(&self) -> usize {
        MAX_CONTAINER_WIDTH
            .min(self.terminal_width.saturating_sub(4))
            .max(MIN_CONTAINER_WIDTH)
    }

    /// Draws `body` in a box with an optional centered, bold title.
    ///
    /// Lines longer than the box are cut. The box itself is centered in the
    /// terminal.
    ///
    /// # Example
    ///
    /// ```
    /// use filegod::output::OutputFormatter;
    ///
    /// let boxed = OutputFormatter::new(80).container("TITLE", "line one\nline two");
    /// assert_eq!(boxed.lines().count(), 6);
    /// ```
    pub fn container(&self, title: &str, body: &str) -> String {
        let width = self.container_width();
        let inner = width - 2;
        let indent = " ".repeat(self.terminal_width.saturating_sub(width) / 2);
        let border = "─".repeat(inner);

        let mut out = String::new();
        out.push_str(&format!("{indent}{}\n", format!("┌{border}┐").red()));

        if !title.is_empty() {
            let title: String = title.chars().take(inner).collect();
            let left = (inner - text_width(&title)) / 2;
            let right = inner - left - text_width(&title);
            out.push_str(&format!(
                "{indent}{}{}{}{}{}\n",
                "│".red(),
                " ".repeat(left),
                title.bold(),
                " ".repeat(right),
                "│".red()
            ));
            out.push_str(&format!("{indent}{}\n", format!("├{border}┤").red()));
        }

        for line in body.lines() {
            let line: String = line.chars().take(width - 4).collect();
            let pad = inner.saturating_sub(1 + text_width(&line));
            out.push_str(&format!(
                "{indent}{}{}{}{}\n",
                "│ ".red(),
                line,
                " ".repeat(pad),
                "│".red()
            ));
        }

        out.push_str(&format!("{indent}{}\n", format!("└{border}┘").red()));
        out
    }

    /// Centers every line of `text` in the terminal, in red.
    pub fn centered(&self, text: &str) -> String {
        text.lines()
            .map(|line| {
                let pad = self.terminal_width.saturating_sub(text_width(line)) / 2;
                format!("{}{}", " ".repeat(pad), line.red())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn banner(&self) -> String {
        self.centered(BANNER)
    }

    /// A numbered menu. Entries are `(key, label)` pairs.
    pub fn menu(&self, title: &str, entries: &[(&str, &str)]) -> String {
        let body = entries
            .iter()
            .map(|(key, label)| format!("[{key}] {label}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.container(title, &body)
    }

    /// A centered prompt label, without a trailing newline.
    pub fn prompt(&self, label: &str) -> String {
        let pad = self.terminal_width.saturating_sub(text_width(label)) / 2;
        format!("\n{}{}", " ".repeat(pad), label.red())
    }

    pub fn error_box(&self, message: &str) -> String {
        self.container("ERROR", message)
    }

    /// Creates a progress bar for a file pass, drawn on stderr.
    ///
    /// The length is set by the pass itself as it reports progress.
    pub fn progress_bar(&self, label: &str) -> ProgressBar {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.red} [{bar:40.red}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(label.to_string());
        pb
    }

    fn record_lines(record: &FileRecord) -> String {
        format!(
            "{}\n  {}\n  {} | modified {}",
            record.name,
            record.path.display(),
            format_file_size(record.size_bytes),
            format_timestamp(&record.modified)
        )
    }

    fn no_results(&self, hint: &str) -> String {
        self.container("NO RESULTS", hint)
    }

    /// Files matched by a filtered search, preceded by the active criteria.
    pub fn filter_results(&self, results: &[FileRecord], criteria: &FilterCriteria) -> String {
        let mut header = String::from("Active filters:\n");
        match (criteria.date_from, criteria.date_to) {
            (None, None) => {}
            (from, to) => {
                let show = |d: Option<chrono::NaiveDate>| {
                    d.map_or_else(|| "any".to_string(), |d| format_date(&d))
                };
                header.push_str(&format!("  Date: {} - {}\n", show(from), show(to)));
            }
        }
        if let Some(name) = &criteria.name_contains {
            header.push_str(&format!("  Name contains: \"{name}\"\n"));
        }
        if let Some(content) = &criteria.content_contains {
            header.push_str(&format!("  Content includes: \"{content}\"\n"));
        }
        if criteria.is_empty() {
            header.push_str("  none\n");
        }
        header.push_str(&format!("\nMatches: {}", results.len()));

        let mut out = self.container("FILTERED SEARCH RESULTS", &header);
        if results.is_empty() {
            out.push_str(&self.no_results("No files match these filters.\nTry loosening them."));
            return out;
        }
        for (index, record) in results.iter().enumerate() {
            out.push_str(&self.container(
                &format!("FILE {}", index + 1),
                &Self::record_lines(record),
            ));
        }
        out
    }

    pub fn name_results(&self, results: &[FileRecord], query: &str) -> String {
        let header = format!("Query: \"{query}\"\nMatches: {}", results.len());
        let mut out = self.container("NAME SEARCH RESULTS", &header);
        if results.is_empty() {
            out.push_str(&self.no_results("No files found.\nTry a different query."));
            return out;
        }
        for (index, record) in results.iter().enumerate() {
            out.push_str(&self.container(
                &format!("FILE {}", index + 1),
                &Self::record_lines(record),
            ));
        }
        out
    }

    pub fn content_results(&self, hits: &[ContentHit], query: &str) -> String {
        let header = format!("Query: \"{query}\"\nFiles: {}", hits.len());
        let mut out = self.container("CONTENT SEARCH RESULTS", &header);
        if hits.is_empty() {
            out.push_str(&self.no_results(
                "No matches found.\nOnly text files are searched.\nTry a different query.",
            ));
            return out;
        }
        for (index, hit) in hits.iter().enumerate() {
            let mut body = Self::record_lines(&hit.record);
            body.push_str(&format!("\n  {}\n", plural(hit.matches.len(), "match", "matches")));
            for (n, m) in hit.matches.iter().enumerate() {
                body.push_str(&format!("\n{}. line {}: {}", n + 1, m.line_number, m.context));
            }
            out.push_str(&self.container(&format!("FILE {}", index + 1), &body));
        }
        out
    }

    pub fn analysis(&self, summary: &AnalysisSummary, root: &Path) -> String {
        let folder = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        let header = format!(
            "Folder: {}\nTotal files: {}\nTotal size: {}",
            folder,
            summary.total_files,
            format_file_size(summary.total_bytes)
        );
        let mut out = self.container("FOLDER ANALYSIS", &header);

        let mut types = String::from("Files by type:\n");
        for (category, stats) in summary.by_count() {
            types.push_str(&format!(
                "\n{} {}: {} - {}",
                category.icon(),
                category,
                plural(stats.files, "file", "files"),
                format_file_size(stats.bytes)
            ));
        }
        out.push_str(&self.container("FILE TYPES", &types));

        let mut sizes = String::from("Share of total size:\n");
        for (category, bytes, share) in summary.by_size() {
            sizes.push_str(&format!(
                "\n{} {}: {} ({:.1}%)",
                category.icon(),
                category,
                format_file_size(bytes),
                share
            ));
        }
        out.push_str(&self.container("SIZES", &sizes));
        out
    }

    pub fn sort_report(&self, report: &SortReport, root: &Path) -> String {
        let verb = if report.dry_run { "would move" } else { "moved" };
        let mut body = String::new();
        for op in &report.moved {
            body.push_str(&format!(
                "{} {} {}/\n",
                Self::file_name(&op.original_path),
                if report.dry_run { "=>" } else { "->" },
                op.category
            ));
        }
        for (path, category) in &report.collisions {
            body.push_str(&format!(
                "{} already exists in {}/, skipped\n",
                Self::file_name(path),
                category
            ));
        }
        for path in &report.unknown {
            body.push_str(&format!("{} - unknown type, left in place\n", Self::file_name(path)));
        }
        for (path, reason) in &report.failed {
            body.push_str(&format!("{} - error: {}\n", Self::file_name(path), reason));
        }
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&format!(
            "Sorted: {}\nFiles {}: {}\nSkipped: {}\nUnknown: {}\nErrors: {}",
            root.display(),
            verb,
            report.moved.len(),
            report.collisions.len(),
            report.unknown.len(),
            report.failed.len()
        ));
        if let Some(warning) = &report.history_warning {
            body.push_str(&format!("\nHistory not saved: {warning}"));
        } else if !report.dry_run && !report.moved.is_empty() {
            body.push_str("\nRun `filegod undo` on this folder to revert.");
        }

        let title = if report.dry_run { "DRY RUN" } else { "SORT COMPLETE" };
        self.container(title, &body)
    }

    pub fn undo_report(&self, report: &UndoReport) -> String {
        let mut body = format!("Restored: {}", report.restored_files);
        if !report.skipped_files.is_empty() {
            body.push_str(&format!("\nSkipped: {}", report.skipped_files.len()));
            for (path, reason) in &report.skipped_files {
                body.push_str(&format!("\n  {}: {}", path.display(), reason));
            }
        }
        if !report.conflicts.is_empty() {
            body.push_str(&format!("\nOriginal location taken: {}", report.conflicts.len()));
            for path in &report.conflicts {
                body.push_str(&format!("\n  {}", path.display()));
            }
        }
        if !report.failed_restores.is_empty() {
            body.push_str(&format!("\nFailed: {}", report.failed_restores.len()));
            for (path, reason) in &report.failed_restores {
                body.push_str(&format!("\n  {}: {}", path.display(), reason));
            }
        }
        if report.has_pending() {
            body.push_str("\n\nHistory kept; fix the issues above and undo again.");
        }
        self.container("UNDO COMPLETE", &body)
    }

    pub fn exif(&self, report: &ExifReport) -> String {
        let record = &report.record;
        let exif = match report.has_exif {
            Some(true) => "yes, EXIF data found",
            Some(false) => "no EXIF data found",
            None => "not checked",
        };
        let body = format!(
            "File: {}\nSize: {}\nCreated: {}\nModified: {}\nType: {}\nDimensions: unknown\nCamera: {}\nEXIF: {}",
            record.name,
            format_file_size(record.size_bytes),
            record
                .created
                .as_ref()
                .map_or_else(|| "unknown".to_string(), format_timestamp),
            format_timestamp(&record.modified),
            report.mime.as_deref().unwrap_or("unknown"),
            report
                .camera
                .as_deref()
                .map_or_else(|| "not found".to_string(), |c| format!("{c} (detected)")),
            exif
        );
        self.container("IMAGE EXIF DATA", &body)
    }

    pub fn mp3(&self, report: &Mp3Report) -> String {
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "not found".to_string());
        let body = format!(
            "File: {}\nSize: {}\nTitle: {}\nArtist: {}\nAlbum: {}\nYear: {}\nID3v1: {}\nID3v2: {}",
            report.record.name,
            format_file_size(report.record.size_bytes),
            field(&report.title),
            field(&report.artist),
            field(&report.album),
            field(&report.year),
            if report.has_id3v1 { "yes" } else { "no" },
            if report.has_id3v2 { "yes" } else { "no" },
        );
        self.container("MP3 ID3 TAGS", &body)
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorter::Operation;
    use std::path::PathBuf;

    fn plain() -> OutputFormatter {
        set_color(false);
        OutputFormatter::new(80)
    }

    #[test]
    fn test_terminal_width_follows_the_attached_terminal() {
        let width = terminal_width();
        match terminal::size() {
            Ok((columns, _)) if columns > 0 => assert_eq!(width, usize::from(columns)),
            _ => assert_eq!(width, DEFAULT_TERMINAL_WIDTH),
        }
    }

    #[test]
    fn test_container_lines_share_one_width() {
        let out = plain().container("TITLE", "short\na somewhat longer line");
        let widths: Vec<usize> = out.lines().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
        assert!(out.contains("TITLE"));
    }

    #[test]
    fn test_container_cuts_long_lines() {
        let long = "x".repeat(200);
        let out = plain().container("", &long);
        assert_eq!(out.lines().count(), 3);
        assert!(out.lines().all(|l| l.chars().count() <= 80));
    }

    #[test]
    fn test_narrow_terminal_keeps_minimum_box() {
        let out = OutputFormatter::new(10).container("", "abc");
        assert!(out.contains("abc"));
    }

    #[test]
    fn test_centered_pads_left() {
        let out = plain().centered("abcd");
        assert_eq!(out, format!("{}abcd", " ".repeat(38)));
    }

    #[test]
    fn test_sort_report_lists_every_outcome() {
        let root = PathBuf::from("/tmp/downloads");
        let report = SortReport {
            moved: vec![Operation {
                original_path: root.join("a.png"),
                new_path: root.join("Images/a.png"),
                category: "Images".to_string(),
            }],
            collisions: vec![(root.join("b.png"), crate::file_category::Category::Images)],
            unknown: vec![root.join("c.xyz")],
            ..Default::default()
        };

        let out = plain().sort_report(&report, &root);
        assert!(out.contains("a.png -> Images/"));
        assert!(out.contains("b.png already exists in Images/"));
        assert!(out.contains("c.xyz - unknown type"));
        assert!(out.contains("Files moved: 1"));
    }

    #[test]
    fn test_undo_report_mentions_history_only_when_moves_remain() {
        let missing_only = UndoReport {
            restored_files: 1,
            skipped_files: vec![(PathBuf::from("/tmp/Images/b.png"), "gone".to_string())],
            ..Default::default()
        };
        assert!(!plain().undo_report(&missing_only).contains("History kept"));

        let conflicted = UndoReport {
            conflicts: vec![PathBuf::from("/tmp/a.png")],
            ..Default::default()
        };
        assert!(plain().undo_report(&conflicted).contains("History kept"));
    }

    #[test]
    fn test_empty_results_explain_themselves() {
        let out = plain().content_results(&[], "needle");
        assert!(out.contains("NO RESULTS"));
        assert!(out.contains("Only text files are searched."));
    }

    #[test]
    fn test_filter_header_shows_open_date_bound() {
        let criteria = FilterCriteria::new()
            .modified_between(chrono::NaiveDate::from_ymd_opt(2024, 1, 5), None)
            .name_contains("report");
        let out = plain().filter_results(&[], &criteria);
        assert!(out.contains("Date: 05.01.2024 - any"));
        assert!(out.contains("Name contains: \"report\""));
    }
}
