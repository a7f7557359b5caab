//! filegod - sort, search, filter and analyze files from the terminal
//!
//! This library provides file categorization by extension, a bounded worker
//! pool for per-file passes, recursive enumeration, multi-criteria filtering,
//! name and content search, per-category analysis, sorting into category
//! folders with undo, lightweight photo and MP3 metadata sniffing, and the
//! interactive menu shell built on top of them.

pub mod analysis;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod filter;
pub mod format;
pub mod metadata;
pub mod output;
pub mod paths;
pub mod pool;
pub mod record;
pub mod search;
pub mod shell;
pub mod sorter;
pub mod undo;
pub mod walker;

pub use app::{Action, App};
pub use config::{ConfigError, ExcludeRules, Settings};
pub use error::{Error, Result};
pub use file_category::{Category, InstallerHint, classify};
pub use filter::{FilterCriteria, filter_files};
pub use pool::{NoProgress, Progress, WorkerPool};
pub use record::FileRecord;
pub use sorter::{SortOptions, SortReport, sort_by_type};
pub use undo::{UndoManager, UndoReport};

pub use cli::{Args, run_cli};
