//! Application layer for Tailor.
//!
//! Use cases over the core domain: replaying, updating and auto-saving
//! sessions, plus the `session:*` command surface that drives them.

pub mod auto_save;
pub mod console;
pub mod formatter;
pub mod runner;
pub mod updater;

pub use auto_save::AutoSaveController;
pub use console::{
    parse_line, ParsedLine, Prompter, SessionCommand, SessionConsole, ShellContext, StdinPrompter,
};
pub use formatter::SessionFormatter;
pub use runner::{ExecutionResult, SessionCommandRunner};
pub use updater::{SessionUpdater, UpdateOutcome, UpdateOverrides};
