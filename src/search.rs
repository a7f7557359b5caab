//! Case-insensitive search over file names and file contents.

use std::fs;
use std::path::{Path, PathBuf};

use crate::file_category::is_text_file;
use crate::filter::MAX_CONTENT_BYTES;
use crate::pool::{Progress, Visit, WorkerPool};
use crate::record::{FileRecord, base_name};

/// At most this many matches are recorded per file.
pub const MAX_MATCHES_PER_FILE: usize = 5;

/// Characters of context kept on each side of a match.
pub const CONTEXT_CHARS: usize = 50;

/// One occurrence of the query inside a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// 1-based line of the match start.
    pub line_number: usize,
    /// Byte offset of the match start in the file's text.
    pub offset: usize,
    /// Surrounding text on a single line, with `...` where it was cut.
    pub context: String,
}

/// A file whose contents matched, with the first few matches.
#[derive(Debug, Clone)]
pub struct ContentHit {
    pub record: FileRecord,
    pub matches: Vec<Match>,
}

/// Lowercases `text` one character at a time.
///
/// Per-character folding keeps the result aligned with the input so offsets
/// found in the folded text can be mapped back, see [`find_matches`].
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Folded text plus enough bookkeeping to map offsets back to the original.
struct FoldedText {
    text: String,
    /// `(folded, original)` offset pairs, recorded after every character whose
    /// folded form has a different byte length. Offsets between two anchors
    /// advance in lockstep.
    anchors: Vec<(usize, usize)>,
}

impl FoldedText {
    fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut anchors = vec![(0, 0)];

        for (idx, ch) in original.char_indices() {
            let before = text.len();
            text.extend(ch.to_lowercase());
            if text.len() - before != ch.len_utf8() {
                anchors.push((text.len(), idx + ch.len_utf8()));
            }
        }

        Self { text, anchors }
    }

    /// Maps a folded byte offset to a char boundary in `original`.
    fn to_original(&self, folded: usize, original: &str) -> usize {
        let slot = self.anchors.partition_point(|(f, _)| *f <= folded);
        let (anchor_folded, anchor_original) = self.anchors[slot.saturating_sub(1)];
        let mut offset = (anchor_original + (folded - anchor_folded)).min(original.len());
        while !original.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

/// Finds up to [`MAX_MATCHES_PER_FILE`] non-overlapping occurrences of `query`.
///
/// Matching is case-insensitive. After each hit the search resumes right
/// after it, so `"aaaa"` contains `"aa"` twice, not three times. Line numbers
/// and context come from the unmodified `content`. An empty query never
/// matches.
///
/// # Examples
///
/// ```
/// use filegod::search::find_matches;
///
/// let matches = find_matches("abcabcabc", "ABC");
/// let offsets: Vec<usize> = matches.iter().map(|m| m.offset).collect();
/// assert_eq!(offsets, vec![0, 3, 6]);
/// ```
pub fn find_matches(content: &str, query: &str) -> Vec<Match> {
    let needle = fold_case(query);
    if needle.is_empty() {
        return Vec::new();
    }

    let folded = FoldedText::new(content);
    let mut matches = Vec::new();
    let mut cursor = 0;

    while matches.len() < MAX_MATCHES_PER_FILE {
        let Some(found) = folded.text[cursor..].find(&needle) else {
            break;
        };
        let folded_start = cursor + found;
        let folded_end = folded_start + needle.len();

        let start = folded.to_original(folded_start, content);
        let end = folded.to_original(folded_end, content).max(start);

        matches.push(Match {
            line_number: line_number_at(content, start),
            offset: start,
            context: context_window(content, start, end),
        });

        cursor = folded_end;
    }

    matches
}

fn line_number_at(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Cuts the match plus [`CONTEXT_CHARS`] on either side and flattens it to one line.
fn context_window(content: &str, start: usize, end: usize) -> String {
    let window_start = content[..start]
        .char_indices()
        .rev()
        .take(CONTEXT_CHARS)
        .last()
        .map_or(start, |(idx, _)| idx);
    let window_end = content[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map_or(content.len(), |(idx, _)| end + idx);

    let mut context = String::new();
    if window_start > 0 {
        context.push_str("...");
    }
    context.push_str(&content[window_start..window_end]);
    if window_end < content.len() {
        context.push_str("...");
    }

    context.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps the paths whose extension marks them as searchable text.
pub fn text_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().filter(|p| is_text_file(p)).cloned().collect()
}

/// Searches the contents of every text file in `paths` for `query`.
///
/// Non-text extensions, files over the size ceiling and files that are not
/// valid UTF-8 are skipped without error. Only files with at least one match
/// are returned, in unspecified order.
pub fn search_content(
    paths: &[PathBuf],
    query: &str,
    pool: &WorkerPool,
    progress: &dyn Progress,
) -> Vec<ContentHit> {
    if query.is_empty() {
        return Vec::new();
    }

    let candidates = text_files(paths);
    let hits = pool.visit(&candidates, progress, |path| search_file(path, query));

    tracing::info!(
        scanned = candidates.len(),
        matched = hits.len(),
        "content search complete"
    );
    hits
}

fn search_file(path: &Path, query: &str) -> Visit<ContentHit> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => return Visit::skipped(path, e),
    };
    if !metadata.is_file() || metadata.len() > MAX_CONTENT_BYTES {
        return Visit::Miss;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return Visit::skipped(path, e),
    };

    let matches = find_matches(&content, query);
    if matches.is_empty() {
        return Visit::Miss;
    }

    match FileRecord::from_metadata(path, &metadata) {
        Ok(record) => Visit::Hit(ContentHit { record, matches }),
        Err(e) => Visit::skipped(path, e),
    }
}

/// Returns the files whose base name contains `query`, ignoring case.
///
/// An empty query never matches.
pub fn search_names(
    paths: &[PathBuf],
    query: &str,
    pool: &WorkerPool,
    progress: &dyn Progress,
) -> Vec<FileRecord> {
    let needle = fold_case(query);
    if needle.is_empty() {
        return Vec::new();
    }

    pool.visit(paths, progress, |path| {
        let name = fold_case(&base_name(path));
        if needle.len() > name.len() || !name.contains(&needle) {
            return Visit::Miss;
        }
        match FileRecord::observe(path) {
            Ok(record) => Visit::Hit(record),
            Err(e) => Visit::skipped(path, e),
        }
    })
}
