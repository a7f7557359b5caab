//! The interactive menu shell.
//!
//! [`Shell`] is a pure state machine: it holds the current [`Screen`], turns
//! one line of input into an [`Effect`], and is told when an action it
//! requested has finished. [`run_shell`] drives it from a line reader and
//! performs the effects.

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use std::collections::VecDeque;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use crate::app::{Action, App};
use crate::error::{Error, Result};
use crate::filter::FilterCriteria;
use crate::format::parse_date;
use crate::output::OutputFormatter;
use crate::paths::expand_path;

const INVALID_OPTION: &str = "Invalid option. Try again.";
const GOODBYE: &str = "Goodbye!";

/// A numbered menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Main,
    Sort,
    Media,
    Metadata,
    Analysis,
    Search,
    Filter,
}

/// Where a menu choice leads.
enum Choice {
    Open(Menu),
    Start(Flow),
    Exit,
}

impl Menu {
    pub fn title(&self) -> &'static str {
        match self {
            Menu::Main => "FILEGOD - MAIN MENU",
            Menu::Sort => "SORT",
            Menu::Media => "MEDIA",
            Menu::Metadata => "METADATA",
            Menu::Analysis => "ANALYSIS",
            Menu::Search => "SEARCH",
            Menu::Filter => "FILTERED SEARCH",
        }
    }

    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Menu::Main => &[
                ("1", "Sort"),
                ("2", "Media"),
                ("3", "Analysis"),
                ("4", "Search"),
                ("0", "Exit"),
            ],
            Menu::Sort => &[
                ("1", "By type"),
                ("2", "Preview (dry run)"),
                ("3", "Undo last sort"),
                ("0", "Back"),
            ],
            Menu::Media => &[("1", "Metadata"), ("0", "Back")],
            Menu::Metadata => &[("1", "EXIF from a photo"), ("2", "Tags from an MP3"), ("0", "Back")],
            Menu::Analysis => &[("1", "Analyze a folder"), ("0", "Back")],
            Menu::Search => &[
                ("1", "By name"),
                ("2", "By content"),
                ("3", "With filters"),
                ("0", "Main menu"),
            ],
            Menu::Filter => &[
                ("1", "Date (from dd.mm.yyyy to dd.mm.yyyy)"),
                ("2", "Name includes..."),
                ("3", "File contains..."),
                ("4", "Several filters"),
                ("0", "Back"),
            ],
        }
    }

    fn parent(&self) -> Menu {
        match self {
            Menu::Main | Menu::Sort | Menu::Media | Menu::Analysis | Menu::Search => Menu::Main,
            Menu::Metadata => Menu::Media,
            Menu::Filter => Menu::Search,
        }
    }

    fn choose(&self, key: &str) -> Option<Choice> {
        let choice = match (self, key) {
            (Menu::Main, "0") => Choice::Exit,
            (_, "0") => Choice::Open(self.parent()),
            (Menu::Main, "1") => Choice::Open(Menu::Sort),
            (Menu::Main, "2") => Choice::Open(Menu::Media),
            (Menu::Main, "3") => Choice::Open(Menu::Analysis),
            (Menu::Main, "4") => Choice::Open(Menu::Search),
            (Menu::Sort, "1") => Choice::Start(Flow::Sort),
            (Menu::Sort, "2") => Choice::Start(Flow::SortPreview),
            (Menu::Sort, "3") => Choice::Start(Flow::Undo),
            (Menu::Media, "1") => Choice::Open(Menu::Metadata),
            (Menu::Metadata, "1") => Choice::Start(Flow::Exif),
            (Menu::Metadata, "2") => Choice::Start(Flow::Mp3),
            (Menu::Analysis, "1") => Choice::Start(Flow::Analyze),
            (Menu::Search, "1") => Choice::Start(Flow::FindNames),
            (Menu::Search, "2") => Choice::Start(Flow::SearchContent),
            (Menu::Search, "3") => Choice::Open(Menu::Filter),
            (Menu::Filter, "1") => Choice::Start(Flow::FilterByDate),
            (Menu::Filter, "2") => Choice::Start(Flow::FilterByName),
            (Menu::Filter, "3") => Choice::Start(Flow::FilterByContent),
            (Menu::Filter, "4") => Choice::Start(Flow::FilterMultiple),
            _ => return None,
        };
        Some(choice)
    }
}

/// A sequence of prompts that ends in an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Sort,
    SortPreview,
    Undo,
    Analyze,
    Exif,
    Mp3,
    FindNames,
    SearchContent,
    FilterByDate,
    FilterByName,
    FilterByContent,
    FilterMultiple,
}

impl Flow {
    fn fields(&self) -> Vec<Field> {
        match self {
            Flow::Sort | Flow::SortPreview | Flow::Undo | Flow::Analyze => vec![Field::Folder],
            Flow::Exif | Flow::Mp3 => vec![Field::File],
            Flow::FindNames | Flow::SearchContent => vec![Field::Folder, Field::Query],
            Flow::FilterByDate => vec![Field::Folder, Field::DateFrom, Field::DateTo],
            Flow::FilterByName => vec![Field::Folder, Field::NameContains],
            Flow::FilterByContent => vec![Field::Folder, Field::ContentContains],
            Flow::FilterMultiple => vec![Field::Folder, Field::Selection],
        }
    }

    /// Menu shown after the action completes.
    fn parent(&self) -> Menu {
        match self {
            Flow::Sort | Flow::SortPreview | Flow::Undo => Menu::Sort,
            Flow::Analyze => Menu::Analysis,
            Flow::Exif | Flow::Mp3 => Menu::Metadata,
            Flow::FindNames | Flow::SearchContent => Menu::Search,
            Flow::FilterByDate
            | Flow::FilterByName
            | Flow::FilterByContent
            | Flow::FilterMultiple => Menu::Filter,
        }
    }

    /// Screen shown after the action fails.
    fn retry(&self) -> Screen {
        match self {
            Flow::FilterMultiple => Screen::Menu(Menu::Filter),
            flow => Screen::Form(Form::new(*flow)),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Flow::Sort => "SORT BY TYPE",
            Flow::SortPreview => "SORT PREVIEW",
            Flow::Undo => "UNDO SORT",
            Flow::Analyze => "FOLDER ANALYSIS",
            Flow::Exif => "EXIF FROM PHOTO",
            Flow::Mp3 => "TAGS FROM MP3",
            Flow::FindNames => "SEARCH BY NAME",
            Flow::SearchContent => "SEARCH BY CONTENT",
            Flow::FilterByDate => "SEARCH BY DATE",
            Flow::FilterByName => "SEARCH BY NAME FILTER",
            Flow::FilterByContent => "SEARCH BY CONTENT FILTER",
            Flow::FilterMultiple => "SEVERAL FILTERS",
        }
    }
}

/// One prompt of a [`Form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Folder,
    File,
    Query,
    DateFrom,
    DateTo,
    NameContains,
    ContentContains,
    /// Comma-separated filter numbers, e.g. `1, 3`.
    Selection,
}

impl Field {
    pub fn prompt(&self) -> &'static str {
        match self {
            Field::Folder => "Path to the folder:",
            Field::File => "Full path to the file:",
            Field::Query => "Search query:",
            Field::DateFrom => "Date FROM (dd.mm.yyyy, empty for no limit):",
            Field::DateTo => "Date TO (dd.mm.yyyy, empty for no limit):",
            Field::NameContains => "Which text should the name contain?",
            Field::ContentContains => "Which text should the file contain?",
            Field::Selection => {
                "Available filters:\n\
                 1 - Date (from dd.mm.yyyy to dd.mm.yyyy)\n\
                 2 - Name includes... (text)\n\
                 3 - File contains... (text)\n\
                 \n\
                 List filter numbers separated by commas (e.g. 1, 2):"
            }
        }
    }
}

/// Parses a filter selection such as `"1, 3"` into the fields to prompt.
///
/// Unknown entries are ignored and repeated numbers count once.
pub fn parse_selection(input: &str) -> Vec<Field> {
    let mut seen = Vec::new();
    for part in input.split(',').map(str::trim) {
        if matches!(part, "1" | "2" | "3") && !seen.contains(&part) {
            seen.push(part);
        }
    }

    seen.into_iter()
        .flat_map(|part| match part {
            "1" => vec![Field::DateFrom, Field::DateTo],
            "2" => vec![Field::NameContains],
            _ => vec![Field::ContentContains],
        })
        .collect()
}

/// Answers collected so far for one flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    flow: Flow,
    pending: VecDeque<Field>,
    path: Option<PathBuf>,
    query: String,
    criteria: FilterCriteria,
}

impl Form {
    fn new(flow: Flow) -> Self {
        Self {
            flow,
            pending: flow.fields().into(),
            path: None,
            query: String::new(),
            criteria: FilterCriteria::new(),
        }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    /// The field the next line of input answers.
    pub fn current(&self) -> Option<Field> {
        self.pending.front().copied()
    }

    /// Records `input` for the current field; on error the field stays current.
    fn answer(&mut self, input: &str) -> Result<()> {
        let Some(field) = self.current() else {
            return Ok(());
        };
        let input = input.trim();

        match field {
            Field::Folder | Field::File => self.path = Some(expand_path(input)?),
            Field::Query => self.query = input.to_string(),
            Field::DateFrom => self.criteria.date_from = optional_date(input)?,
            Field::DateTo => self.criteria.date_to = optional_date(input)?,
            Field::NameContains => {
                self.criteria = std::mem::take(&mut self.criteria).name_contains(input)
            }
            Field::ContentContains => {
                self.criteria = std::mem::take(&mut self.criteria).content_contains(input)
            }
            Field::Selection => {
                self.pending.pop_front();
                self.pending.extend(parse_selection(input));
                return Ok(());
            }
        }

        self.pending.pop_front();
        Ok(())
    }

    /// Builds the action once every field is answered.
    fn action(&self) -> Option<Action> {
        if !self.pending.is_empty() {
            return None;
        }
        let path = self.path.clone()?;
        let action = match self.flow {
            Flow::Sort => Action::Sort {
                root: path,
                dry_run: false,
            },
            Flow::SortPreview => Action::Sort {
                root: path,
                dry_run: true,
            },
            Flow::Undo => Action::Undo { root: path },
            Flow::Analyze => Action::Analyze { root: path },
            Flow::Exif => Action::Exif { path },
            Flow::Mp3 => Action::Mp3 { path },
            Flow::FindNames => Action::FindNames {
                root: path,
                query: self.query.clone(),
            },
            Flow::SearchContent => Action::SearchContent {
                root: path,
                query: self.query.clone(),
            },
            Flow::FilterByDate
            | Flow::FilterByName
            | Flow::FilterByContent
            | Flow::FilterMultiple => Action::Filter {
                root: path,
                criteria: self.criteria.clone(),
            },
        };
        Some(action)
    }
}

fn optional_date(input: &str) -> Result<Option<chrono::NaiveDate>> {
    if input.is_empty() {
        Ok(None)
    } else {
        parse_date(input).map(Some)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Menu(Menu),
    Form(Form),
    /// Waits for Enter, then shows `next`.
    Pause { next: Box<Screen>, retry: bool },
}

/// What the driver should do after a line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Redraw the current screen.
    None,
    /// Show a short message, then redraw the current screen.
    Notice(String),
    /// Perform the action and report back through [`Screen::finish`].
    Run(Action),
    Exit,
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub next: Screen,
    pub effect: Effect,
}

impl Step {
    fn to(next: Screen) -> Self {
        Self {
            next,
            effect: Effect::None,
        }
    }

    fn stay(current: Screen, effect: Effect) -> Self {
        Self {
            next: current,
            effect,
        }
    }
}

impl Screen {
    /// Consumes one line of input. Pure: nothing is read or written.
    pub fn handle(self, input: &str) -> Step {
        match self {
            Screen::Menu(menu) => match menu.choose(input.trim()) {
                Some(Choice::Open(next)) => Step::to(Screen::Menu(next)),
                Some(Choice::Start(flow)) => Step::to(Screen::Form(Form::new(flow))),
                Some(Choice::Exit) => Step::stay(self, Effect::Exit),
                None => Step::stay(self, Effect::Notice(INVALID_OPTION.to_string())),
            },
            Screen::Form(mut form) => {
                if let Err(e) = form.answer(input) {
                    return Step::stay(Screen::Form(form), Effect::Notice(e.to_string()));
                }
                let effect = form.action().map_or(Effect::None, Effect::Run);
                Step::stay(Screen::Form(form), effect)
            }
            Screen::Pause { next, .. } => Step::to(*next),
        }
    }

    /// Moves past a finished action.
    ///
    /// Success returns to the flow's menu. A failure offers to retry the
    /// prompt that started the action; an unsupported file format returns
    /// to the menu instead.
    pub fn finish(self, outcome: std::result::Result<(), &Error>) -> Screen {
        let Screen::Form(form) = &self else {
            return self;
        };
        let flow = form.flow;

        match outcome {
            Ok(()) | Err(Error::UnsupportedFormat { .. }) => Screen::Pause {
                next: Box::new(Screen::Menu(flow.parent())),
                retry: false,
            },
            Err(_) => Screen::Pause {
                next: Box::new(flow.retry()),
                retry: true,
            },
        }
    }
}

/// Holds the current screen between lines of input.
#[derive(Debug)]
pub struct Shell {
    screen: Screen,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Self {
            screen: Screen::Menu(Menu::Main),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn handle(&mut self, input: &str) -> Effect {
        let current = std::mem::replace(&mut self.screen, Screen::Menu(Menu::Main));
        let step = current.handle(input);
        self.screen = step.next;
        step.effect
    }

    pub fn finish(&mut self, outcome: std::result::Result<(), &Error>) {
        let current = std::mem::replace(&mut self.screen, Screen::Menu(Menu::Main));
        self.screen = current.finish(outcome);
    }

    /// Renders the current screen, ending with its prompt.
    pub fn render(&self, formatter: &OutputFormatter) -> String {
        match &self.screen {
            Screen::Menu(menu) => {
                let mut out = String::new();
                if *menu == Menu::Main {
                    out.push_str(&formatter.banner());
                    out.push('\n');
                }
                out.push_str(&formatter.menu(menu.title(), menu.entries()));
                out.push_str(&formatter.prompt("Choose an option: "));
                out
            }
            Screen::Form(form) => {
                let text = form.current().map_or("", |field| field.prompt());
                let mut out = formatter.container(form.flow.title(), text);
                out.push_str(&formatter.prompt("> "));
                out
            }
            Screen::Pause { retry, .. } => {
                let label = if *retry {
                    "Press Enter to retry..."
                } else {
                    "Press Enter to return..."
                };
                format!("\n{}\n", formatter.centered(label))
            }
        }
    }
}

/// Runs the shell until the user exits or input ends.
pub fn run_shell<R: BufRead, W: Write>(app: &App, input: R, mut out: W) -> Result<()> {
    let formatter = *app.formatter();
    let clear = std::io::stdout().is_terminal();
    let mut shell = Shell::new();
    let mut lines = input.lines();

    loop {
        if clear && matches!(shell.screen(), Screen::Menu(_)) {
            execute!(out, Clear(ClearType::All), MoveTo(0, 0)).map_err(Error::Terminal)?;
        }
        write!(out, "{}", shell.render(&formatter)).map_err(Error::Terminal)?;
        out.flush().map_err(Error::Terminal)?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(Error::Terminal)?;

        match shell.handle(&line) {
            Effect::None => {}
            Effect::Notice(message) => {
                writeln!(out, "\n{}", formatter.centered(&message)).map_err(Error::Terminal)?;
            }
            Effect::Run(action) => {
                writeln!(out, "{}", formatter.container("WORKING", "Scanning files..."))
                    .map_err(Error::Terminal)?;
                let result = app.run(&action);
                let rendered = match &result {
                    Ok(report) => report.clone(),
                    Err(e) => {
                        tracing::debug!(error = %e, "action failed");
                        formatter.error_box(&format!("Error: {e}"))
                    }
                };
                write!(out, "{rendered}").map_err(Error::Terminal)?;
                shell.finish(result.as_ref().map(|_| ()));
            }
            Effect::Exit => break,
        }
    }

    writeln!(out, "\n{}", formatter.centered(GOODBYE)).map_err(Error::Terminal)?;
    Ok(())
}

/// Message printed when the user interrupts the program.
pub fn goodbye(formatter: &OutputFormatter) -> String {
    formatter.centered(GOODBYE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_at(inputs: &[&str]) -> (Shell, Vec<Effect>) {
        let mut shell = Shell::new();
        let effects = inputs.iter().map(|i| shell.handle(i)).collect();
        (shell, effects)
    }

    fn form(shell: &Shell) -> &Form {
        match shell.screen() {
            Screen::Form(form) => form,
            other => panic!("expected a form, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_option_keeps_screen() {
        let (shell, effects) = shell_at(&["9"]);
        assert_eq!(effects, vec![Effect::Notice(INVALID_OPTION.to_string())]);
        assert_eq!(shell.screen(), &Screen::Menu(Menu::Main));
    }

    #[test]
    fn test_back_and_exit() {
        let (shell, _) = shell_at(&["2", "1", "0"]);
        assert_eq!(shell.screen(), &Screen::Menu(Menu::Media));

        let (_, effects) = shell_at(&["4", "0", "0"]);
        assert_eq!(effects.last(), Some(&Effect::Exit));
    }

    #[test]
    fn test_name_search_collects_path_then_query() {
        let (shell, effects) = shell_at(&["4", "1", "/tmp", "report"]);
        assert_eq!(
            effects.last(),
            Some(&Effect::Run(Action::FindNames {
                root: PathBuf::from("/tmp"),
                query: "report".to_string(),
            }))
        );
        assert_eq!(form(&shell).flow(), Flow::FindNames);
    }

    #[test]
    fn test_bad_date_reprompts_same_field() {
        let (shell, effects) = shell_at(&["4", "3", "1", "/tmp", "2024-01-01"]);
        assert!(matches!(effects.last(), Some(Effect::Notice(_))));
        assert_eq!(form(&shell).current(), Some(Field::DateFrom));
    }

    #[test]
    fn test_date_filter_builds_inclusive_range() {
        let (_, effects) = shell_at(&["4", "3", "1", "/tmp", "01.01.2024", "31.01.2024"]);
        let Some(Effect::Run(Action::Filter { criteria, .. })) = effects.last() else {
            panic!("expected a filter action");
        };
        assert_eq!(criteria.date_from, chrono::NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(criteria.date_to, chrono::NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    #[test]
    fn test_multiple_filters_follow_selection() {
        let (shell, _) = shell_at(&["4", "3", "4", "/tmp", "3, 9, 2, 3"]);
        assert_eq!(form(&shell).current(), Some(Field::ContentContains));

        let (_, effects) = shell_at(&["4", "3", "4", "/tmp", "3, 9, 2", "needle", "report"]);
        let Some(Effect::Run(Action::Filter { criteria, .. })) = effects.last() else {
            panic!("expected a filter action");
        };
        assert_eq!(criteria.content_contains.as_deref(), Some("needle"));
        assert_eq!(criteria.name_contains.as_deref(), Some("report"));
        assert_eq!(criteria.date_from, None);
    }

    #[test]
    fn test_empty_selection_runs_unfiltered() {
        let (_, effects) = shell_at(&["4", "3", "4", "/tmp", ""]);
        let Some(Effect::Run(Action::Filter { criteria, .. })) = effects.last() else {
            panic!("expected a filter action");
        };
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_success_pauses_then_returns_to_menu() {
        let (mut shell, _) = shell_at(&["3", "1", "/tmp"]);
        shell.finish(Ok(()));
        assert!(matches!(shell.screen(), Screen::Pause { retry: false, .. }));

        shell.handle("");
        assert_eq!(shell.screen(), &Screen::Menu(Menu::Analysis));
    }

    #[test]
    fn test_failure_retries_the_prompt() {
        let (mut shell, _) = shell_at(&["1", "1", "/missing"]);
        let err = Error::NotADirectory(PathBuf::from("/missing"));
        shell.finish(Err(&err));
        shell.handle("");

        assert_eq!(form(&shell).flow(), Flow::Sort);
        assert_eq!(form(&shell).current(), Some(Field::Folder));
    }

    #[test]
    fn test_unsupported_format_returns_to_menu() {
        let (mut shell, _) = shell_at(&["2", "1", "1", "/tmp/song.wav"]);
        let err = Error::UnsupportedFormat {
            path: PathBuf::from("/tmp/song.wav"),
            expected: ".jpg".to_string(),
        };
        shell.finish(Err(&err));
        shell.handle("");
        assert_eq!(shell.screen(), &Screen::Menu(Menu::Metadata));
    }

    #[test]
    fn test_transitions_are_values() {
        let step = Screen::Menu(Menu::Search).handle("3");
        assert_eq!(step.next, Screen::Menu(Menu::Filter));
        assert_eq!(step.effect, Effect::None);

        let paused = Screen::Pause {
            next: Box::new(Screen::Menu(Menu::Sort)),
            retry: false,
        };
        assert_eq!(paused.handle("anything").next, Screen::Menu(Menu::Sort));
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!(
            parse_selection("1,2"),
            vec![Field::DateFrom, Field::DateTo, Field::NameContains]
        );
        assert!(parse_selection("x, 7").is_empty());
    }
}
