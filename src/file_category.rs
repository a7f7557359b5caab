//! File categorization by extension.
//!
//! Categories are checked in a fixed declaration order and the first one whose
//! extension list contains the file's extension wins. The Installers category
//! can additionally be reached through a filename indicator, see
//! [`InstallerHint`].
//!
//! # Examples
//!
//! ```
//! use filegod::file_category::{classify, Category, InstallerHint};
//! use std::path::Path;
//!
//! assert_eq!(classify(Path::new("photo.JPG"), InstallerHint::Install), Category::Images);
//! assert_eq!(classify(Path::new("Tool.pkg"), InstallerHint::Install), Category::Programs);
//! assert_eq!(classify(Path::new("notes.xyz"), InstallerHint::Install), Category::Other);
//! ```

use std::fmt;
use std::path::Path;

/// Represents a broad file category.
///
/// The derived ordering follows declaration order, which is also the lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Images,
    Video,
    Audio,
    Programs,
    Installers,
    Docx,
    Zip,
    Code,
    Scripts,
    /// Anything no other category claims.
    Other,
}

/// Lookup table in declaration order. `Other` has no entry.
const CATEGORY_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Images,
        &[
            "png", "jpg", "jpeg", "gif", "bmp", "tiff", "svg", "webp", "avif", "ico", "heic", "heif",
        ],
    ),
    (
        Category::Video,
        &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "3gp"],
    ),
    (
        Category::Audio,
        &[
            "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus", "aiff", "caf",
        ],
    ),
    (
        Category::Programs,
        &["app", "pkg", "dmg", "deb", "rpm", "exe", "msi"],
    ),
    (Category::Installers, &["pkg", "dmg", "installer"]),
    (
        Category::Docx,
        &[
            "docx", "doc", "txt", "pdf", "rtf", "odt", "pages", "key", "numbers",
        ],
    ),
    // Compound entries never match: only the text after the final dot is compared.
    (
        Category::Zip,
        &[
            "zip", "rar", "7z", "tar", "gz", "bz2", "xz", "tar.gz", "tar.bz2", "sitx",
        ],
    ),
    (
        Category::Code,
        &[
            "py", "js", "ts", "html", "css", "cpp", "c", "cs", "java", "php", "rb", "go", "rs",
            "kt", "swift", "r", "scala", "m", "mm", "plist",
        ],
    ),
    (
        Category::Scripts,
        &[
            "sh",
            "zsh",
            "bash",
            "fish",
            "command",
            "applescript",
            "scpt",
            "automator",
        ],
    ),
];

/// Extensions whose contents are decoded as text for content search.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "js", "ts", "py", "html", "css", "json", "xml", "md", "csv", "log", "ini", "cfg",
    "conf", "yml", "yaml", "sql", "php", "rb", "go", "rs", "cpp", "c", "cs", "java", "kt",
    "swift", "r", "scala", "sh", "zsh", "bash", "m", "mm", "plist",
];

impl Category {
    /// Every category, `Other` last.
    pub const ALL: [Category; 10] = [
        Category::Images,
        Category::Video,
        Category::Audio,
        Category::Programs,
        Category::Installers,
        Category::Docx,
        Category::Zip,
        Category::Code,
        Category::Scripts,
        Category::Other,
    ];

    /// Returns the folder name the sorter uses for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use filegod::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Zip.dir_name(), "ZIP");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Video => "Video",
            Category::Audio => "Audio",
            Category::Programs => "Programs",
            Category::Installers => "Installers",
            Category::Docx => "Docx",
            Category::Zip => "ZIP",
            Category::Code => "Code",
            Category::Scripts => "Scripts",
            Category::Other => "Other",
        }
    }

    /// Categories that get a folder when sorting.
    pub fn sortable() -> impl Iterator<Item = Category> {
        CATEGORY_TABLE.iter().map(|(category, _)| *category)
    }

    /// Small glyph shown next to the category in reports.
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Images => "🖼️",
            Category::Video => "🎥",
            Category::Audio => "🎵",
            Category::Programs => "🍎",
            Category::Installers => "📦",
            Category::Docx => "📄",
            Category::Zip => "🗜️",
            Category::Code => "💻",
            Category::Scripts => "📜",
            Category::Other => "❓",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Which filename substrings mark a file as an installer.
///
/// Analysis and filtering look for `install` only; the sorter also accepts
/// `setup`. Both are kept as named variants so callers pick explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerHint {
    /// Stem contains `install`.
    Install,
    /// Stem contains `install` or `setup`.
    InstallOrSetup,
}

impl InstallerHint {
    fn matches(&self, stem: &str) -> bool {
        match self {
            InstallerHint::Install => stem.contains("install"),
            InstallerHint::InstallOrSetup => stem.contains("install") || stem.contains("setup"),
        }
    }
}

/// Splits a base name into a lowercased stem and extension (without the dot).
///
/// Only the final dot counts, and a dot in first position does not start an
/// extension, so `.bashrc` has no extension and `a.tar.gz` has `gz`.
///
/// # Examples
///
/// ```
/// use filegod::file_category::split_name;
///
/// assert_eq!(split_name("Report.PDF"), ("report".to_string(), Some("pdf".to_string())));
/// assert_eq!(split_name(".bashrc"), (".bashrc".to_string(), None));
/// ```
pub fn split_name(name: &str) -> (String, Option<String>) {
    let lower = name.to_lowercase();
    match lower.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = lower[idx + 1..].to_string();
            let mut stem = lower;
            stem.truncate(idx);
            (stem, Some(ext))
        }
        _ => (lower, None),
    }
}

/// Returns the lowercased extension of `path`, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    split_name(&name).1
}

/// Returns true if files with this path's extension are searched as text.
pub fn is_text_file(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

/// Maps a path to its category.
///
/// Pure: only the file name is inspected, the filesystem is never touched.
pub fn classify(path: &Path, hint: InstallerHint) -> Category {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    classify_name(&name, hint)
}

/// Same as [`classify`] for a bare file name.
pub fn classify_name(name: &str, hint: InstallerHint) -> Category {
    let (stem, ext) = split_name(name);

    for (category, extensions) in CATEGORY_TABLE {
        if let Some(ext) = ext.as_deref()
            && extensions.contains(&ext)
        {
            return *category;
        }

        if *category == Category::Installers && hint.matches(&stem) {
            return Category::Installers;
        }
    }

    Category::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> Category {
        classify_name(name, InstallerHint::Install)
    }

    #[test]
    fn test_category_dir_names() {
        assert_eq!(Category::Images.dir_name(), "Images");
        assert_eq!(Category::Video.dir_name(), "Video");
        assert_eq!(Category::Audio.dir_name(), "Audio");
        assert_eq!(Category::Programs.dir_name(), "Programs");
        assert_eq!(Category::Installers.dir_name(), "Installers");
        assert_eq!(Category::Docx.dir_name(), "Docx");
        assert_eq!(Category::Zip.dir_name(), "ZIP");
        assert_eq!(Category::Code.dir_name(), "Code");
        assert_eq!(Category::Scripts.dir_name(), "Scripts");
        assert_eq!(Category::Other.dir_name(), "Other");
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(class("photo.png"), Category::Images);
        assert_eq!(class("clip.mkv"), Category::Video);
        assert_eq!(class("song.flac"), Category::Audio);
        assert_eq!(class("tool.exe"), Category::Programs);
        assert_eq!(class("thing.installer"), Category::Installers);
        assert_eq!(class("letter.docx"), Category::Docx);
        assert_eq!(class("backup.7z"), Category::Zip);
        assert_eq!(class("main.rs"), Category::Code);
        assert_eq!(class("deploy.sh"), Category::Scripts);
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(class("PHOTO.PNG"), Category::Images);
        assert_eq!(class("Song.Mp3"), Category::Audio);
    }

    #[test]
    fn test_declaration_order_wins_on_overlap() {
        assert_eq!(class("Tool.pkg"), Category::Programs);
        assert_eq!(class("Tool.dmg"), Category::Programs);
        // The indicator cannot pull an earlier category's extension away.
        assert_eq!(class("installer.pkg"), Category::Programs);
    }

    #[test]
    fn test_installer_indicator_beats_later_categories() {
        assert_eq!(class("my-installer-setup.xyz"), Category::Installers);
        assert_eq!(class("install-notes.txt"), Category::Installers);
        assert_eq!(class("readme.txt"), Category::Docx);
    }

    #[test]
    fn test_setup_only_counts_for_sorter_hint() {
        assert_eq!(
            classify_name("setup-tool.xyz", InstallerHint::Install),
            Category::Other
        );
        assert_eq!(
            classify_name("setup-tool.xyz", InstallerHint::InstallOrSetup),
            Category::Installers
        );
        assert_eq!(
            classify_name("my-installer-setup.xyz", InstallerHint::InstallOrSetup),
            Category::Installers
        );
    }

    #[test]
    fn test_compound_extension_uses_final_dot() {
        assert_eq!(class("archive.tar.gz"), Category::Zip);
        assert_eq!(split_name("archive.tar.gz").1.as_deref(), Some("gz"));
    }

    #[test]
    fn test_unknown_and_extensionless_are_other() {
        assert_eq!(class("notes.xyz"), Category::Other);
        assert_eq!(class("Makefile"), Category::Other);
        assert_eq!(class(".bashrc"), Category::Other);
        assert_eq!(class(""), Category::Other);
    }

    #[test]
    fn test_classify_is_deterministic() {
        for name in ["a.png", "b.pkg", "install.me", "c", "d.tar.bz2"] {
            assert_eq!(class(name), class(name));
        }
    }

    #[test]
    fn test_text_extensions() {
        assert!(is_text_file(Path::new("/x/notes.md")));
        assert!(is_text_file(Path::new("/x/Main.RS")));
        assert!(!is_text_file(Path::new("/x/photo.png")));
        assert!(!is_text_file(Path::new("/x/README")));
    }

    #[test]
    fn test_sortable_excludes_other() {
        let sortable: Vec<_> = Category::sortable().collect();
        assert_eq!(sortable.len(), 9);
        assert!(!sortable.contains(&Category::Other));
        assert_eq!(sortable[0], Category::Images);
    }
}
