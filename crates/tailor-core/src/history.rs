//! Reading the append-only history log.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::command_filter::CommandFilter;
use crate::session::SessionTracker;

/// Header lines some line editors write into their history files.
pub const SENTINELS: [&str; 2] = ["_HiStOrY_V2_", "#V2"];

/// Reads the history log the shell appends every submitted line to.
///
/// A missing or unreadable log is treated as empty.
#[derive(Debug, Clone)]
pub struct HistoryReader {
    path: PathBuf,
    filter: CommandFilter,
}

impl HistoryReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filter: CommandFilter::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines currently in the log.
    pub fn line_count(&self) -> usize {
        self.read_lines().len()
    }

    /// Lines at index `start_line` and after, trimmed, with internal commands
    /// and sentinels removed.
    pub fn capture_since(&self, start_line: usize) -> Vec<String> {
        self.read_lines()
            .into_iter()
            .skip(start_line)
            .map(|line| line.trim().to_string())
            .filter(|line| !is_sentinel(line) && !self.filter.should_skip(line))
            .collect()
    }

    /// Sets the tracker's watermark to the current end of the log.
    pub fn mark_start(&self, tracker: &mut SessionTracker) {
        let line = self.line_count();
        tracing::debug!("[History] Session starts at line {} of {:?}", line, self.path);
        tracker.set_session_start_line(line);
    }

    /// Rebuilds the tracker's captured commands from the log since its watermark.
    pub fn capture_into_tracker(&self, tracker: &mut SessionTracker) {
        let lines = self.capture_since(tracker.session_start_line());
        tracker.record_captured(lines);
    }

    fn read_lines(&self) -> Vec<String> {
        match fs::read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("[History] No history log at {:?}", self.path);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("[History] Failed to read {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }
}

pub fn is_sentinel(line: &str) -> bool {
    SENTINELS.contains(&line.trim())
}
