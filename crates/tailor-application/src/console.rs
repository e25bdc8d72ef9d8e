//! The session command surface shared by the shell and the CLI.
//!
//! In the shell, a line such as `session:save demo --tags api,debug` is split
//! with shell quoting rules and parsed by clap into a [`SessionCommand`]; the
//! CLI gets the same enum straight from its own argument parser. Either way
//! [`SessionConsole::dispatch`] runs it and returns a process-style exit code.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use chrono::Local;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tailor_core::history::HistoryReader;
use tailor_core::interpreter::Interpreter;
use tailor_core::session::{
    SessionDescription, SessionMetadata, SessionName, SessionRepository, SessionTag, SessionTags,
    SessionTracker,
};
use tailor_core::{timestamp, Result, TailorError};

use crate::formatter::SessionFormatter;
use crate::runner::SessionCommandRunner;
use crate::updater::{SessionUpdater, UpdateOutcome, UpdateOverrides};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Prefix of session commands typed in the shell.
pub const COMMAND_PREFIX: &str = "session:";

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// List saved sessions, newest first
    List {
        /// Only sessions carrying this tag (repeatable)
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
    },
    /// Save the commands of the current shell session
    Save {
        /// Session name (generated when omitted)
        name: Option<String>,
        /// Overwrite an existing session without asking
        #[arg(short, long)]
        force: bool,
        #[arg(short, long)]
        description: Option<String>,
        /// Comma-separated or repeated tags
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Show a saved session's metadata, commands and variables
    View { name: String },
    /// Replay a saved session in the current shell
    #[command(visible_alias = "load")]
    Execute { name: String },
    /// Change a saved session's description or tags
    Edit {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short = 'a', long = "add-tag")]
        add_tags: Vec<String>,
        #[arg(short = 'r', long = "remove-tag")]
        remove_tags: Vec<String>,
        /// Replace all tags
        #[arg(long = "set-tags", value_delimiter = ',')]
        set_tags: Vec<String>,
    },
    /// Delete a saved session
    Delete {
        name: String,
        /// Delete without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Append the commands typed since loading to the loaded session
    Update {
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            SessionCommand::List { .. } => "list",
            SessionCommand::Save { .. } => "save",
            SessionCommand::View { .. } => "view",
            SessionCommand::Execute { .. } => "execute",
            SessionCommand::Edit { .. } => "edit",
            SessionCommand::Delete { .. } => "delete",
            SessionCommand::Update { .. } => "update",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "session", disable_help_subcommand = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

/// Result of looking at one shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Not a session command; belongs to the interpreter.
    NotSession,
    Command(SessionCommand),
    /// `--help` was requested; the rendered help text.
    Help(String),
    /// Malformed session command; the rendered error.
    Invalid(String),
}

/// Recognises `session:<op> ...` and the bare `update` alias.
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    let Some(first) = line.split_whitespace().next() else {
        return ParsedLine::NotSession;
    };
    let op = match first.strip_prefix(COMMAND_PREFIX) {
        Some(op) => op,
        None if first == "update" => "update",
        None => return ParsedLine::NotSession,
    };

    let words = match shell_words::split(line) {
        Ok(words) => words,
        Err(e) => return ParsedLine::Invalid(format!("Invalid command line: {e}")),
    };
    let args = ["session", op]
        .into_iter()
        .map(str::to_string)
        .chain(words.into_iter().skip(1));

    match SessionLine::try_parse_from(args) {
        Ok(parsed) => ParsedLine::Command(parsed.command),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            ParsedLine::Help(e.to_string())
        }
        Err(e) => ParsedLine::Invalid(e.to_string()),
    }
}

/// Asks the user a yes/no question.
pub trait Prompter {
    /// True only for an explicit yes.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Prompts on stdout and reads the answer from stdin; `y`/`yes` confirm.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&mut self, question: &str) -> bool {
        print!("{} ", format!("{question} [y/N]").yellow());
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// The live shell state a command may need. The CLI runs detached.
#[derive(Default)]
pub struct ShellContext<'a> {
    pub tracker: Option<&'a mut SessionTracker>,
    pub interpreter: Option<&'a mut dyn Interpreter>,
}

impl<'a> ShellContext<'a> {
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn live(tracker: &'a mut SessionTracker, interpreter: &'a mut dyn Interpreter) -> Self {
        Self {
            tracker: Some(tracker),
            interpreter: Some(interpreter),
        }
    }
}

pub struct SessionConsole {
    repository: Arc<dyn SessionRepository>,
    history: HistoryReader,
    runner: SessionCommandRunner,
    updater: SessionUpdater,
    formatter: SessionFormatter,
    prompter: Box<dyn Prompter>,
}

impl SessionConsole {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        history: HistoryReader,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            updater: SessionUpdater::new(repository.clone(), history.clone()),
            repository,
            history,
            runner: SessionCommandRunner::new(),
            formatter: SessionFormatter::new(),
            prompter,
        }
    }

    pub fn runner(&self) -> &SessionCommandRunner {
        &self.runner
    }

    /// Parses and runs a shell line. `None` when the line is not a session command.
    pub fn run_line(
        &mut self,
        line: &str,
        ctx: ShellContext<'_>,
        out: &mut dyn Write,
    ) -> Option<i32> {
        let code = match parse_line(line) {
            ParsedLine::NotSession => return None,
            ParsedLine::Command(command) => self.dispatch(command, ctx, out),
            ParsedLine::Help(text) => {
                let _ = write!(out, "{text}");
                EXIT_SUCCESS
            }
            ParsedLine::Invalid(text) => {
                let _ = write!(out, "{text}");
                EXIT_FAILURE
            }
        };
        Some(code)
    }

    /// Runs one command. Every failure is printed as a single line and mapped
    /// to [`EXIT_FAILURE`].
    pub fn dispatch(
        &mut self,
        command: SessionCommand,
        ctx: ShellContext<'_>,
        out: &mut dyn Write,
    ) -> i32 {
        let action = command.action();
        tracing::debug!("[Console] Running session:{}", action);

        let result = match command {
            SessionCommand::List { tags } => self.list(&tags, out),
            SessionCommand::Save {
                name,
                force,
                description,
                tags,
            } => self.save(ctx, name, force, description, &tags, out),
            SessionCommand::View { name } => self.view(&name, out),
            SessionCommand::Execute { name } => self.execute(ctx, &name, out),
            SessionCommand::Edit {
                name,
                description,
                add_tags,
                remove_tags,
                set_tags,
            } => self.edit(&name, description, &add_tags, &remove_tags, &set_tags, out),
            SessionCommand::Delete { name, force } => self.delete(&name, force, out),
            SessionCommand::Update { description, tags } => {
                return self.update(ctx, UpdateOverrides { description, tags }, out);
            }
        };

        match result {
            Ok(code) => code,
            Err(e) => report(out, action, &e),
        }
    }

    fn list(&mut self, tags: &[String], out: &mut dyn Write) -> Result<i32> {
        let tags = SessionTag::parse_all(tags)?;
        let sessions = self.repository.list(&tags)?;
        self.formatter.list(out, &sessions)?;
        Ok(EXIT_SUCCESS)
    }

    fn save(
        &mut self,
        ctx: ShellContext<'_>,
        name: Option<String>,
        force: bool,
        description: Option<String>,
        tags: &[String],
        out: &mut dyn Write,
    ) -> Result<i32> {
        let tracker = ctx.tracker.ok_or_else(|| requires_shell("save"))?;

        self.history.capture_into_tracker(tracker);
        if !tracker.has_commands() {
            writeln!(
                out,
                "{}",
                "No commands to save. Execute some commands first.".yellow()
            )?;
            return Ok(EXIT_FAILURE);
        }

        let name = match name {
            Some(name) => name,
            None => {
                let generated = format!("session-{}", Local::now().format("%Y-%m-%d-%H%M%S"));
                writeln!(
                    out,
                    "{}",
                    format!("Auto-generated session name: {generated}").yellow()
                )?;
                generated
            }
        };
        let name = SessionName::new(name)?;
        let description = SessionDescription::from_optional(description.as_deref())?;
        let tags = SessionTags::new(tags)?;

        if !force && self.repository.exists(&name)? {
            writeln!(
                out,
                "{}",
                format!("Session '{name}' already exists.").yellow()
            )?;
            if !self.prompter.confirm("Overwrite existing session?") {
                writeln!(out, "{}", "Save cancelled.".green())?;
                return Ok(EXIT_SUCCESS);
            }
        }

        let metadata = SessionMetadata::new(name)
            .with_description(description)
            .with_tags(tags);
        let data = self.repository.save(&metadata, tracker)?;
        self.formatter.save_summary(out, &data)?;
        Ok(EXIT_SUCCESS)
    }

    fn view(&mut self, name: &str, out: &mut dyn Write) -> Result<i32> {
        let name = SessionName::new(name)?;
        let data = self.repository.load(&name)?;
        self.formatter.view(out, &data)?;
        Ok(EXIT_SUCCESS)
    }

    fn execute(&mut self, ctx: ShellContext<'_>, name: &str, out: &mut dyn Write) -> Result<i32> {
        let (Some(tracker), Some(interpreter)) = (ctx.tracker, ctx.interpreter) else {
            return Err(requires_shell("execute"));
        };

        let name = SessionName::new(name)?;
        let data = self.repository.load(&name)?;

        self.formatter.execution_header(out, &data)?;
        let result = self.runner.execute(interpreter, &data, tracker, out, true);
        self.runner.display_summary(&result, out)?;
        Ok(EXIT_SUCCESS)
    }

    fn edit(
        &mut self,
        name: &str,
        description: Option<String>,
        add_tags: &[String],
        remove_tags: &[String],
        set_tags: &[String],
        out: &mut dyn Write,
    ) -> Result<i32> {
        let name = SessionName::new(name)?;
        let mut data = self.repository.load(&name)?;

        let current = data.metadata.tags.clone();
        let tags = if set_tags.is_empty() {
            current
                .add(&SessionTag::parse_all(add_tags)?)?
                .remove(&SessionTag::parse_all(remove_tags)?)
        } else {
            SessionTags::new(set_tags)?
        };

        if description.is_none() && tags == current {
            writeln!(
                out,
                "{}",
                "No changes specified. Use --description, --add-tag, --remove-tag, or --set-tags."
                    .yellow()
            )?;
            return Ok(EXIT_SUCCESS);
        }

        if description.is_some() {
            data.metadata.description = SessionDescription::from_optional(description.as_deref())?;
        }
        data.metadata.tags = tags;
        data.metadata.updated_at = Some(timestamp::now_utc());

        self.repository.update(&data)?;
        self.formatter.edit_summary(out, &data)?;
        Ok(EXIT_SUCCESS)
    }

    fn delete(&mut self, name: &str, force: bool, out: &mut dyn Write) -> Result<i32> {
        let name = SessionName::new(name)?;
        if !self.repository.exists(&name)? {
            return Err(TailorError::session_not_found(name.as_str()));
        }

        if !force
            && !self
                .prompter
                .confirm(&format!("Are you sure you want to delete session '{name}'?"))
        {
            writeln!(out, "{}", "Delete cancelled.".green())?;
            return Ok(EXIT_SUCCESS);
        }

        self.repository.delete(&name)?;
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            format!("✓ Session '{name}' deleted successfully!").green()
        )?;
        writeln!(out)?;
        Ok(EXIT_SUCCESS)
    }

    fn update(
        &mut self,
        ctx: ShellContext<'_>,
        overrides: UpdateOverrides,
        out: &mut dyn Write,
    ) -> i32 {
        let Some(tracker) = ctx.tracker else {
            return report(out, "update", &requires_shell("update"));
        };

        match self.updater.update(tracker, &overrides) {
            Ok(UpdateOutcome::NothingToAdd { .. }) => {
                let _ = writeln!(
                    out,
                    "{}",
                    "No new commands to add to the session.".yellow()
                );
                EXIT_SUCCESS
            }
            Ok(UpdateOutcome::Updated { name, added, total }) => {
                let _ = writeln!(
                    out,
                    "{}",
                    format!("✓ Session '{name}' updated successfully!").green()
                );
                let _ = writeln!(out, "  {}", format!("Added {added} new command(s)").yellow());
                let _ = writeln!(out, "  {}", format!("Total commands: {total}").yellow());
                EXIT_SUCCESS
            }
            Err(TailorError::NoSessionLoaded) => {
                let _ = writeln!(out, "{}", TailorError::NoSessionLoaded.to_string().red());
                let _ = writeln!(
                    out,
                    "{}",
                    "Load a session using: tailor --session my-work".yellow()
                );
                EXIT_FAILURE
            }
            Err(e @ TailorError::Corrupt { .. }) => report(out, "load", &e),
            Err(e) => report(out, "update", &e),
        }
    }
}

fn requires_shell(action: &str) -> TailorError {
    TailorError::validation(format!(
        "'{COMMAND_PREFIX}{action}' needs a live shell. Start one with `tailor`."
    ))
}

/// Prints one error line and returns the failure exit code.
fn report(out: &mut dyn Write, action: &str, error: &TailorError) -> i32 {
    let message = match error {
        TailorError::Validation(_)
        | TailorError::NotFound { .. }
        | TailorError::Storage { .. }
        | TailorError::NoSessionLoaded => error.to_string(),
        other => format!("Failed to {action} session: {other}"),
    };
    tracing::debug!("[Console] session:{} failed: {}", action, error);
    let _ = writeln!(out, "{}", message.red());
    EXIT_FAILURE
}
