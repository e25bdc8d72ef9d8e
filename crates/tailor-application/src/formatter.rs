//! Console rendering of sessions.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use colored::Colorize;
use tailor_core::decoder::CommandDecoder;
use tailor_core::history::is_sentinel;
use tailor_core::session::{SessionData, SessionSummary, VariableSnapshot};
use tailor_core::timestamp;

const RULE_WIDTH: usize = 81;

#[derive(Debug, Clone, Default)]
pub struct SessionFormatter {
    decoder: CommandDecoder,
}

impl SessionFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, out: &mut dyn Write, sessions: &[SessionSummary]) -> io::Result<()> {
        if sessions.is_empty() {
            return writeln!(out, "{}", "No saved sessions found.".yellow());
        }

        writeln!(out, "{}", "Saved Sessions:".green())?;
        writeln!(out)?;
        for session in sessions {
            let created = session
                .created_at
                .as_deref()
                .and_then(timestamp::parse)
                .map(|at| display_time(&at))
                .unwrap_or_else(|| "unknown".to_string());
            write!(
                out,
                "  {} - {} ({} commands)",
                session.name.as_str().cyan(),
                created,
                session.command_count
            )?;
            if !session.tags.is_empty() {
                write!(out, " {}", format!("[{}]", session.tags.join(", ")).magenta())?;
            }
            writeln!(out)?;
            if let Some(description) = &session.description {
                writeln!(out, "      {}", description.bright_black())?;
            }
        }
        Ok(())
    }

    /// Full view: metadata, the decoded command listing, variables.
    pub fn view(&self, out: &mut dyn Write, data: &SessionData) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", format!("Session: {}", data.name()).green())?;
        writeln!(out)?;
        self.metadata(out, data)?;
        writeln!(out)?;
        self.commands(out, data)?;
        writeln!(out)?;
        if data.has_variables() {
            self.variables(out, data)?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn metadata(&self, out: &mut dyn Write, data: &SessionData) -> io::Result<()> {
        let metadata = &data.metadata;
        writeln!(out, "{}", "Metadata:".yellow())?;
        writeln!(out)?;

        if let Some(description) = &metadata.description {
            field(out, "Description:", description.as_str())?;
        }
        if metadata.has_tags() {
            field(out, "Tags:", &metadata.tags.joined())?;
        }
        field(out, "Commands:", &data.command_count().to_string())?;
        if !data.stats.project_path.is_empty() {
            field(out, "Project:", &data.stats.project_path)?;
        }
        if let Some(created_at) = &metadata.created_at {
            field(out, "Created:", &display_time(created_at))?;
        }
        if let Some(updated_at) = &metadata.updated_at {
            field(out, "Updated:", &display_time(updated_at))?;
        }
        if let Some(version) = &metadata.interpreter_version {
            field(out, "Interpreter:", version)?;
        }
        if let Some(version) = &metadata.runtime_version {
            field(out, "Runtime:", version)?;
        }
        field(out, "Duration:", &format!("{}s", data.stats.duration_seconds))
    }

    fn commands(&self, out: &mut dyn Write, data: &SessionData) -> io::Result<()> {
        writeln!(
            out,
            "{} {}",
            "Commands:".yellow(),
            format!("({} total)", data.command_count()).bright_black()
        )?;
        writeln!(out)?;

        if !data.has_commands() {
            return writeln!(out, "  {}", "No commands recorded".yellow());
        }

        let rule = "─".repeat(RULE_WIDTH);
        writeln!(out, "{}", rule.bright_black())?;
        for command in &data.commands {
            let code = self.decoder.decode(&command.code);
            if is_sentinel(&code) {
                continue;
            }
            writeln!(out, "{code}")?;
        }
        writeln!(out, "{}", rule.bright_black())
    }

    fn variables(&self, out: &mut dyn Write, data: &SessionData) -> io::Result<()> {
        writeln!(out, "{}", "Variables:".yellow())?;
        writeln!(out)?;
        for (name, snapshot) in &data.variables {
            writeln!(
                out,
                "  {}  =  {}",
                format!("${name}").cyan(),
                format_variable(snapshot)
            )?;
        }
        Ok(())
    }

    pub fn save_summary(&self, out: &mut dyn Write, data: &SessionData) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", "✓ Session saved successfully!".green())?;
        writeln!(out)?;
        self.name_block(out, data, true)
    }

    pub fn edit_summary(&self, out: &mut dyn Write, data: &SessionData) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", "✓ Session updated successfully!".green())?;
        writeln!(out)?;
        self.name_block(out, data, false)
    }

    pub fn execution_header(&self, out: &mut dyn Write, data: &SessionData) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", "✓ Executing session...".green())?;
        writeln!(out)?;
        field_narrow(out, "Name:", data.name().as_str())?;
        field_narrow(out, "Commands:", &data.command_count().to_string())?;
        if let Some(description) = &data.metadata.description {
            field_narrow(out, "Description:", description.as_str())?;
        }
        writeln!(out)
    }

    fn name_block(&self, out: &mut dyn Write, data: &SessionData, with_count: bool) -> io::Result<()> {
        field_narrow(out, "Name:", data.name().as_str())?;
        if with_count {
            field_narrow(out, "Commands:", &data.command_count().to_string())?;
        }
        if let Some(description) = &data.metadata.description {
            field_narrow(out, "Description:", description.as_str())?;
        }
        if data.metadata.has_tags() {
            field_narrow(out, "Tags:", &data.metadata.tags.joined())?;
        }
        writeln!(out)
    }
}

fn field(out: &mut dyn Write, label: &str, value: &str) -> io::Result<()> {
    writeln!(out, "  {} {}", format!("{label:<13}").cyan(), value)
}

fn field_narrow(out: &mut dyn Write, label: &str, value: &str) -> io::Result<()> {
    writeln!(out, "  {} {}", format!("{label:<12}").cyan(), value)
}

fn display_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One-line rendering of a stored variable snapshot.
pub fn format_variable(snapshot: &VariableSnapshot) -> String {
    let value = snapshot.value.as_deref().unwrap_or("");
    match snapshot.kind.as_str() {
        "null" => "null".bright_black().to_string(),
        "bool" | "boolean" => {
            if value == "true" {
                "true".green().to_string()
            } else {
                "false".red().to_string()
            }
        }
        "string" => format!("\"{value}\""),
        "int" | "integer" | "float" | "double" => value.to_string(),
        "list" | "array" => value.magenta().to_string(),
        "object" => snapshot
            .class
            .as_deref()
            .unwrap_or("object")
            .magenta()
            .to_string(),
        other => other.bright_black().to_string(),
    }
}
