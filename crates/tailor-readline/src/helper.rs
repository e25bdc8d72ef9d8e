//! Line-editor helper: completion, hints and highlighting for shell commands.

use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tailor_application::console::COMMAND_PREFIX;

const SESSION_OPERATIONS: [&str; 8] = [
    "list", "save", "view", "execute", "load", "edit", "delete", "update",
];

/// Commands handled by the shell itself.
pub const SHELL_COMMANDS: [&str; 5] = ["help", "clear", "history", "exit", "quit"];

#[derive(Clone)]
pub struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    pub fn new() -> Self {
        let commands = SESSION_OPERATIONS
            .iter()
            .map(|op| format!("{COMMAND_PREFIX}{op}"))
            .chain(SHELL_COMMANDS.iter().map(|c| c.to_string()))
            .collect();
        Self { commands }
    }

    /// Candidates for a partially typed first word.
    fn matching<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.commands
            .iter()
            .filter(move |cmd| !prefix.is_empty() && cmd.starts_with(prefix))
    }
}

impl Default for CliHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        // Only the command word itself is completed.
        if line.contains(char::is_whitespace) {
            return Ok((0, vec![]));
        }
        let candidates = self
            .matching(line)
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let first = line.split_whitespace().next().unwrap_or_default();
        if first.starts_with(COMMAND_PREFIX) || first == "update" {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with(COMMAND_PREFIX) && !line.contains(' ') {
            self.matching(line)
                .find(|cmd| cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}
