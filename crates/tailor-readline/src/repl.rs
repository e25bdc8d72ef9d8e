//! One shell cycle: record the line, route it, then run the auto-save hook.

use std::io::Write;

use colored::Colorize;
use tailor_application::{AutoSaveController, SessionCommand, SessionConsole, ShellContext};
use tailor_core::history::HistoryReader;
use tailor_core::interpreter::Interpreter;
use tailor_core::session::SessionTracker;

use crate::history_log::HistoryLog;
use crate::interpreter::ScratchInterpreter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Everything the shell owns apart from the line editor.
pub struct Repl {
    console: SessionConsole,
    auto_save: AutoSaveController,
    history: HistoryReader,
    history_log: HistoryLog,
    tracker: SessionTracker,
    interpreter: ScratchInterpreter,
}

impl Repl {
    /// Builds the shell state and marks where this session starts in the log,
    /// before any line is read.
    pub fn new(
        console: SessionConsole,
        auto_save: AutoSaveController,
        history: HistoryReader,
        history_log: HistoryLog,
        interpreter: ScratchInterpreter,
    ) -> Self {
        let mut tracker = SessionTracker::new();
        history.mark_start(&mut tracker);
        Self {
            console,
            auto_save,
            history,
            history_log,
            tracker,
            interpreter,
        }
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Replays a saved session into the live interpreter (`--session`).
    pub fn replay(&mut self, name: &str, out: &mut dyn Write) -> i32 {
        let command = SessionCommand::Execute {
            name: name.to_string(),
        };
        let ctx = ShellContext::live(&mut self.tracker, &mut self.interpreter);
        self.console.dispatch(command, ctx, out)
    }

    pub fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }
        if let Err(e) = self.history_log.append(line) {
            tracing::warn!(
                "[Shell] Failed to append to {:?}: {}",
                self.history_log.path(),
                e
            );
        }

        let first = line.split_whitespace().next().unwrap_or_default();
        match first {
            "exit" | "quit" => {
                let _ = writeln!(out, "{}", "Goodbye!".bright_green());
                return Flow::Exit;
            }
            "help" => write_help(out),
            "clear" => {
                let _ = write!(out, "\x1B[2J\x1B[1;1H");
            }
            "history" => self.write_history(out),
            _ => {
                let ctx = ShellContext::live(&mut self.tracker, &mut self.interpreter);
                if self.console.run_line(line, ctx, out).is_none() {
                    self.evaluate(line, out);
                }
            }
        }

        if let Some(name) = self.auto_save.on_idle(&mut self.tracker) {
            tracing::debug!("[Shell] Auto-saved as '{}'", name);
        }
        Flow::Continue
    }

    fn evaluate(&mut self, code: &str, out: &mut dyn Write) {
        match self.interpreter.execute(code) {
            Ok(value) => {
                if !value.is_null() {
                    let _ = self.interpreter.write_return_value(&value, out);
                }
                for (name, value) in self.interpreter.variables() {
                    self.tracker.track_variable(name, &value);
                }
            }
            Err(e) => {
                let _ = writeln!(out, "{}", format!("Error: {e}").red());
            }
        }
    }

    /// Commands captured in this session so far, loaded ones included.
    fn write_history(&mut self, out: &mut dyn Write) {
        self.history.capture_into_tracker(&mut self.tracker);
        if !self.tracker.has_commands() {
            let _ = writeln!(out, "{}", "No commands recorded yet.".yellow());
            return;
        }
        for command in self.tracker.commands() {
            let _ = writeln!(
                out,
                "{} {}",
                format!("{:>4}", command.order).bright_black(),
                command.code
            );
        }
    }
}

fn write_help(out: &mut dyn Write) {
    let rows = [
        ("session:list [--tag T]", "List saved sessions"),
        ("session:save [name] [-d D] [-t T,..] [-f]", "Save this session"),
        ("session:view <name>", "Show a saved session"),
        ("session:execute <name> (or session:load)", "Replay a saved session here"),
        ("session:edit <name> [options]", "Change description or tags"),
        ("session:delete <name> [-f]", "Delete a saved session"),
        ("session:update (or update)", "Append new commands to the loaded session"),
        ("history", "Commands captured in this session"),
        ("clear", "Clear the screen"),
        ("exit, quit", "Leave the shell"),
    ];
    let _ = writeln!(out, "{}", "Commands:".yellow());
    for (usage, about) in rows {
        let _ = writeln!(out, "  {:<44} {}", usage.cyan(), about);
    }
    let _ = writeln!(
        out,
        "{}",
        "Anything else is evaluated, e.g. `$total = 2 * 21`.".bright_black()
    );
}
