//! Replaying a stored session against a live interpreter.

use std::io::{self, Write};

use colored::Colorize;
use tailor_core::decoder::CommandDecoder;
use tailor_core::history::is_sentinel;
use tailor_core::interpreter::Interpreter;
use tailor_core::session::{SessionData, SessionTracker};

/// Tally of one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub executed: usize,
    pub failed: usize,
}

/// Submits a session's commands to an interpreter in stored order.
///
/// A failing command is counted and reported, never fatal to the run.
#[derive(Debug, Clone, Default)]
pub struct SessionCommandRunner {
    decoder: CommandDecoder,
}

impl SessionCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays `data`, then seeds the tracker with its commands and name.
    ///
    /// The tracker is seeded whatever the outcome, so a later `update` has the
    /// stored commands as its baseline. Output write failures are ignored.
    pub fn execute(
        &self,
        interpreter: &mut dyn Interpreter,
        data: &SessionData,
        tracker: &mut SessionTracker,
        out: &mut dyn Write,
        display_output: bool,
    ) -> ExecutionResult {
        let mut result = ExecutionResult::default();

        for command in &data.commands {
            let code = self.decoder.decode(&command.code);
            if is_sentinel(&code) {
                continue;
            }

            if display_output {
                let _ = writeln!(out, "{}", format!(">>> {code}").yellow());
            }

            match interpreter.execute(&code) {
                Ok(value) => {
                    if display_output && !value.is_null() {
                        let _ = interpreter.write_return_value(&value, out);
                    }
                    result.executed += 1;
                }
                Err(e) => {
                    tracing::debug!("[Runner] Command #{} failed: {}", command.order, e);
                    result.failed += 1;
                    if display_output {
                        let _ = writeln!(out, "{}", format!("Failed to execute: {e}").red());
                    }
                }
            }
        }

        tracker.load_commands(data.commands.clone());
        tracker.set_loaded_session_name(data.name().clone());

        tracing::info!(
            "[Runner] Replayed '{}': {} executed, {} failed",
            data.name(),
            result.executed,
            result.failed
        );
        result
    }

    pub fn display_summary(&self, result: &ExecutionResult, out: &mut dyn Write) -> io::Result<()> {
        let mut line = format!("Executed {} command(s)", result.executed);
        if result.failed > 0 {
            line.push_str(&format!(" ({} failed)", result.failed));
        }
        writeln!(out)?;
        writeln!(out, "{}", line.green())?;
        writeln!(
            out,
            "{}",
            "You can continue working and use 'session:update' to save new commands.".yellow()
        )?;
        writeln!(out)
    }
}
