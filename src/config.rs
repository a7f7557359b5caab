//! Settings loaded from TOML.
//!
//! Two tables are recognised: `[scan]` for the worker pool and `[exclude]`
//! for files that scans and sorts should never touch. Hidden entries are
//! always skipped and need no rule.
//!
//! Example:
//!
//! ```toml
//! [scan]
//! workers = 0          # 0 = one worker per available core
//!
//! [exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["node_modules/**", "*.tmp"]
//! extensions = ["bak"]
//! regex = ["^~\\$"]
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory settings file.
pub const LOCAL_CONFIG_NAME: &str = ".filegod.toml";

/// Errors that can occur while loading or compiling settings.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// The document is not valid TOML or has the wrong shape.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// Offending source text.
        pattern: String,
        /// Why the regex crate rejected it.
        reason: String,
    },
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub exclude: ExcludeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Size of the worker pool. `0` picks the number of available cores.
    #[serde(default)]
    pub workers: usize,
}

/// Files to leave out of every scan and sort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeConfig {
    /// Exact base names (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the path relative to the scan root.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, case-insensitive.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the base name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Settings {
    /// Loads settings, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (must exist)
    /// 2. `.filegod.toml` in the current directory
    /// 3. `~/.config/filegod/config.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_NAME);
        if local.is_file() {
            return Self::load_from_file(&local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("filegod").join("config.toml");
            if user_config.exists() {
                return Self::load_from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConfigError::ConfigNotFound(path.to_path_buf()))
            }
            Err(e) => Err(ConfigError::IoError(e.to_string())),
        }
    }

    /// Parses settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compiles the exclusion table.
    pub fn exclude_rules(&self) -> Result<ExcludeRules, ConfigError> {
        ExcludeRules::new(&self.exclude)
    }
}

/// Pre-compiled exclusion rules.
///
/// Patterns are validated once here instead of on every file.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl ExcludeRules {
    /// Rules that exclude nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(config: &ExcludeConfig) -> Result<Self, ConfigError> {
        let patterns = config
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = config
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            filenames: config.filenames.iter().cloned().collect(),
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
            && self.extensions.is_empty()
            && self.patterns.is_empty()
            && self.regexes.is_empty()
    }

    /// Returns true if `path` should be left out.
    ///
    /// `relative` is the path relative to the scan root and is what glob
    /// patterns are matched against.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.filenames.contains(file_name.as_ref()) {
            return true;
        }

        if let Some(ext) = crate::file_category::split_name(&file_name).1
            && self.extensions.contains(&ext)
        {
            return true;
        }

        if self
            .patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative))
        {
            return true;
        }

        self.regexes.iter().any(|regex| regex.is_match(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(config: ExcludeConfig) -> ExcludeRules {
        ExcludeRules::new(&config).unwrap()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.scan.workers, 0);
        assert!(settings.exclude_rules().unwrap().is_empty());
    }

    #[test]
    fn test_parse_full_document() {
        let settings = Settings::from_toml(
            r#"
            [scan]
            workers = 4

            [exclude]
            filenames = ["Thumbs.db"]
            patterns = ["node_modules/**"]
            extensions = ["BAK"]
            regex = ["^draft_"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.scan.workers, 4);
        assert_eq!(settings.exclude.filenames, vec!["Thumbs.db".to_string()]);
    }

    #[test]
    fn test_missing_tables_use_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.scan.workers, 0);
        assert!(settings.exclude.patterns.is_empty());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = Settings::from_toml("[scan\nworkers = ");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let rules = rules(ExcludeConfig {
            filenames: vec!["Thumbs.db".to_string()],
            ..Default::default()
        });
        assert!(rules.is_excluded(Path::new("photos/Thumbs.db")));
        assert!(!rules.is_excluded(Path::new("photos/image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let rules = rules(ExcludeConfig {
            extensions: vec!["bak".to_string(), ".TMP".to_string()],
            ..Default::default()
        });
        assert!(rules.is_excluded(Path::new("file.bak")));
        assert!(rules.is_excluded(Path::new("file.BAK")));
        assert!(rules.is_excluded(Path::new("file.tmp")));
        assert!(!rules.is_excluded(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_respects_directory_boundaries() {
        let rules = rules(ExcludeConfig {
            patterns: vec!["**/logs/**".to_string()],
            ..Default::default()
        });
        assert!(rules.is_excluded(Path::new("logs/file.txt")));
        assert!(rules.is_excluded(Path::new("app/logs/file.txt")));
        assert!(!rules.is_excluded(Path::new("my_logs/file.txt")));
    }

    #[test]
    fn test_exclude_regex_on_base_name() {
        let rules = rules(ExcludeConfig {
            regex: vec![r"^draft_.*\.md$".to_string()],
            ..Default::default()
        });
        assert!(rules.is_excluded(Path::new("notes/draft_one.md")));
        assert!(!rules.is_excluded(Path::new("notes/final.md")));
    }

    #[test]
    fn test_invalid_patterns_return_errors() {
        let glob = ExcludeRules::new(&ExcludeConfig {
            patterns: vec!["[invalid".to_string()],
            ..Default::default()
        });
        assert!(matches!(glob, Err(ConfigError::InvalidGlobPattern(_))));

        let regex = ExcludeRules::new(&ExcludeConfig {
            regex: vec!["[invalid(".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            regex,
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }
}
