//! Command-line interface module for filegod.
//!
//! Parses arguments, loads settings and hands off either to a single
//! subcommand or, when none is given, to the interactive shell.

use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::app::{Action, App};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::filter::FilterCriteria;
use crate::format::parse_date;
use crate::output::{OutputFormatter, set_color};
use crate::paths::expand_path;
use crate::shell::run_shell;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "filegod",
    version,
    about = "Sort, search, filter and analyze files from the terminal"
)]
pub struct Args {
    /// Settings file (default: ./.filegod.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Worker threads for file passes (0 = one per core)
    #[arg(short = 'j', long, global = true)]
    pub workers: Option<usize>,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// More log output on stderr (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Run one command; without it the interactive menu starts
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Applies environment overrides after parsing.
    pub fn validated(mut self) -> Self {
        if std::env::var_os("NO_COLOR").is_some() {
            self.no_color = true;
        }
        self
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move the files of a folder into per-type subfolders
    Sort {
        dir: String,
        /// Show what would move without touching anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Revert the last sort of a folder
    Undo { dir: String },
    /// Count and size files by type, recursively
    Analyze { dir: String },
    /// Find files whose name contains a string
    Find { dir: String, query: String },
    /// Find text files whose contents contain a string
    Grep { dir: String, query: String },
    /// Filter files by modification date, name and contents
    Filter {
        dir: String,
        /// Earliest modification day, dd.mm.yyyy
        #[arg(long)]
        from: Option<String>,
        /// Latest modification day, dd.mm.yyyy
        #[arg(long)]
        to: Option<String>,
        /// Name must contain this string
        #[arg(long)]
        name: Option<String>,
        /// Contents must contain this string
        #[arg(long)]
        content: Option<String>,
    },
    /// Show EXIF indicators of a photo
    Exif { file: String },
    /// Show ID3 tags of an MP3 file
    Mp3 { file: String },
}

impl Command {
    /// Resolves paths and dates into an [`Action`].
    pub fn into_action(self) -> Result<Action> {
        let action = match self {
            Command::Sort { dir, dry_run } => Action::Sort {
                root: expand_path(&dir)?,
                dry_run,
            },
            Command::Undo { dir } => Action::Undo {
                root: expand_path(&dir)?,
            },
            Command::Analyze { dir } => Action::Analyze {
                root: expand_path(&dir)?,
            },
            Command::Find { dir, query } => Action::FindNames {
                root: expand_path(&dir)?,
                query,
            },
            Command::Grep { dir, query } => Action::SearchContent {
                root: expand_path(&dir)?,
                query,
            },
            Command::Filter {
                dir,
                from,
                to,
                name,
                content,
            } => {
                let from = from.as_deref().map(parse_date).transpose()?;
                let to = to.as_deref().map(parse_date).transpose()?;
                let criteria = FilterCriteria::new()
                    .modified_between(from, to)
                    .name_contains(name.unwrap_or_default())
                    .content_contains(content.unwrap_or_default());
                Action::Filter {
                    root: expand_path(&dir)?,
                    criteria,
                }
            }
            Command::Exif { file } => Action::Exif {
                path: expand_path(&file)?,
            },
            Command::Mp3 { file } => Action::Mp3 {
                path: expand_path(&file)?,
            },
        };
        Ok(action)
    }
}

/// Loads settings with the command-line overrides applied.
pub fn load_settings(config: Option<&Path>, workers: Option<usize>) -> Result<Settings> {
    let mut settings = Settings::load(config)?;
    if let Some(workers) = workers {
        settings.scan.workers = workers;
    }
    Ok(settings)
}

/// Runs filegod with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use filegod::cli::{run_cli, Args};
///
/// let args = Args::parse_from(["filegod", "find", "~/Documents", "invoice"]);
/// if let Err(e) = run_cli(args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(args: Args) -> Result<()> {
    if args.no_color {
        set_color(false);
    }

    let settings = load_settings(args.config.as_deref(), args.workers)?;
    let app = App::new(&settings, OutputFormatter::default())?;

    match args.command {
        Some(command) => {
            let action = command.into_action()?;
            let report = app.run(&action)?;
            let mut stdout = io::stdout().lock();
            write!(stdout, "{report}").map_err(Error::Terminal)?;
            stdout.flush().map_err(Error::Terminal)
        }
        None => run_shell(&app, io::stdin().lock(), io::stdout()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn test_no_subcommand_starts_shell() {
        assert_eq!(parse(&["filegod"]).command, None);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["filegod", "sort", "/tmp", "--dry-run", "-j", "3", "-vv"]);
        assert_eq!(args.workers, Some(3));
        assert_eq!(args.verbose, 2);
        assert_eq!(
            args.command,
            Some(Command::Sort {
                dir: "/tmp".to_string(),
                dry_run: true
            })
        );
    }

    #[test]
    fn test_filter_dates_are_parsed() {
        let args = parse(&[
            "filegod", "filter", "/tmp", "--from", "01.02.2024", "--name", "report",
        ]);
        let action = args.command.unwrap().into_action().unwrap();
        let Action::Filter { root, criteria } = action else {
            panic!("expected a filter action");
        };
        assert_eq!(root, PathBuf::from("/tmp"));
        assert_eq!(criteria.date_from, chrono::NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(criteria.date_to, None);
        assert_eq!(criteria.name_contains.as_deref(), Some("report"));
        assert_eq!(criteria.content_contains, None);
    }

    #[test]
    fn test_filter_rejects_bad_dates() {
        let args = parse(&["filegod", "filter", "/tmp", "--to", "2024-02-01"]);
        let result = args.command.unwrap().into_action();
        assert!(matches!(result, Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_worker_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "[scan]\nworkers = 2\n").unwrap();

        let settings = load_settings(Some(&config), None).unwrap();
        assert_eq!(settings.scan.workers, 2);
        let settings = load_settings(Some(&config), Some(5)).unwrap();
        assert_eq!(settings.scan.workers, 5);
    }
}
