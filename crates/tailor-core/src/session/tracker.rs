//! The live recorder of the session in progress.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::model::{max_order, CommandEntry, VariableSnapshot};
use super::name::SessionName;
use crate::interpreter::Value;

/// Longest rendered string value kept in a variable snapshot.
const MAX_SNAPSHOT_CHARS: usize = 80;

/// In-memory state of the current shell session.
///
/// One tracker exists per shell run and it is never persisted directly; the store
/// projects it into a [`super::SessionData`] when saving.
///
/// `session_start_line` is the history-log watermark: only lines at or after it
/// belong to this session. `clear()` leaves it and the loaded session name alone.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    commands: Vec<CommandEntry>,
    /// Commands handed over by `load_commands`; captured history is appended after them.
    baseline: Vec<CommandEntry>,
    variables: BTreeMap<String, VariableSnapshot>,
    started_at: DateTime<Utc>,
    session_start_line: usize,
    loaded_session_name: Option<SessionName>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::with_start_time(Utc::now())
    }

    /// A tracker whose timer started at `started_at`.
    pub fn with_start_time(started_at: DateTime<Utc>) -> Self {
        Self {
            commands: Vec::new(),
            baseline: Vec::new(),
            variables: BTreeMap::new(),
            started_at,
            session_start_line: 0,
            loaded_session_name: None,
        }
    }

    pub fn add_command(&mut self, code: impl Into<String>, output: Option<String>) {
        let mut entry = CommandEntry::new(code, max_order(&self.commands) + 1);
        entry.output = output;
        self.commands.push(entry);
    }

    /// Replaces the command list verbatim and remembers it as the baseline
    /// that later history captures build on.
    pub fn load_commands(&mut self, commands: Vec<CommandEntry>) {
        self.baseline = commands.clone();
        self.commands = commands;
    }

    /// Rebuilds the command list as baseline + `lines`, numbering the new lines
    /// after the baseline's highest order.
    pub fn record_captured<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands = self.baseline.clone();
        for line in lines {
            self.add_command(line, None);
        }
    }

    /// Empties commands and variables and restarts the timer.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.baseline.clear();
        self.variables.clear();
        self.started_at = Utc::now();
    }

    pub fn commands(&self) -> &[CommandEntry] {
        &self.commands
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn last_command(&self) -> Option<&CommandEntry> {
        self.commands.last()
    }

    pub fn track_variable(&mut self, name: impl Into<String>, value: &Value) {
        self.variables.insert(name.into(), snapshot(value));
    }

    pub fn variables(&self) -> &BTreeMap<String, VariableSnapshot> {
        &self.variables
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole seconds since the timer started.
    pub fn duration_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    pub fn session_start_line(&self) -> usize {
        self.session_start_line
    }

    pub fn set_session_start_line(&mut self, line: usize) {
        self.session_start_line = line;
    }

    pub fn loaded_session_name(&self) -> Option<&SessionName> {
        self.loaded_session_name.as_ref()
    }

    pub fn set_loaded_session_name(&mut self, name: SessionName) {
        self.loaded_session_name = Some(name);
    }

    pub fn has_loaded_session(&self) -> bool {
        self.loaded_session_name.is_some()
    }
}

fn snapshot(value: &Value) -> VariableSnapshot {
    VariableSnapshot {
        kind: value.type_name().to_string(),
        class: value.class_name().map(str::to_string),
        value: Some(render(value)),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Str(s) => truncate(&escape(s)),
        Value::List(items) => format!("list({})", items.len()),
        other => truncate(&other.to_string()),
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' | '"' | '\'' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_SNAPSHOT_CHARS {
        return value.to_string();
    }
    let head: String = value.chars().take(MAX_SNAPSHOT_CHARS - 3).collect();
    format!("{head}...")
}
