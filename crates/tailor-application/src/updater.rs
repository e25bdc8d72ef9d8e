//! Incremental update of the loaded session.
//!
//! `SessionUpdater` appends the commands typed since the session was loaded to
//! its stored document: load → merge → update. It never goes through `save`, so
//! the stored `created_at` and statistics survive.

use std::sync::Arc;

use tailor_core::command_filter::CommandFilter;
use tailor_core::history::HistoryReader;
use tailor_core::session::{
    max_order, CommandEntry, SessionDescription, SessionName, SessionRepository, SessionTags,
    SessionTracker,
};
use tailor_core::{timestamp, Result, TailorError};

/// Metadata replacements applied together with the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOverrides {
    /// Replaces the description when non-blank.
    pub description: Option<String>,
    /// Replaces the tags when non-empty.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No new commands since the watermark; nothing was written.
    NothingToAdd { name: SessionName },
    Updated {
        name: SessionName,
        added: usize,
        total: usize,
    },
}

pub struct SessionUpdater {
    repository: Arc<dyn SessionRepository>,
    history: HistoryReader,
    filter: CommandFilter,
}

impl SessionUpdater {
    pub fn new(repository: Arc<dyn SessionRepository>, history: HistoryReader) -> Self {
        Self {
            repository,
            history,
            filter: CommandFilter::new(),
        }
    }

    /// Merges newly typed commands into the tracker's loaded session.
    ///
    /// # Errors
    ///
    /// - `NoSessionLoaded` when the tracker has no loaded session
    /// - `Validation` for invalid overrides
    /// - `NotFound` / `Corrupt` when the stored session cannot be loaded
    /// - `Storage` when writing fails
    pub fn update(
        &self,
        tracker: &mut SessionTracker,
        overrides: &UpdateOverrides,
    ) -> Result<UpdateOutcome> {
        let name = tracker
            .loaded_session_name()
            .cloned()
            .ok_or(TailorError::NoSessionLoaded)?;

        let description = match overrides.description.as_deref() {
            Some(text) if !text.trim().is_empty() => Some(SessionDescription::new(text)?),
            _ => None,
        };
        let tags = if overrides.tags.is_empty() {
            None
        } else {
            Some(SessionTags::new(&overrides.tags)?)
        };

        let mut data = self.repository.load(&name)?;

        let new_lines: Vec<String> = self
            .history
            .capture_since(tracker.session_start_line())
            .into_iter()
            .filter(|line| !self.filter.is_update_command(line))
            .collect();

        if new_lines.is_empty() {
            tracing::debug!("[SessionUpdater] Nothing new for '{}'", name);
            return Ok(UpdateOutcome::NothingToAdd { name });
        }

        let base_order = max_order(&data.commands);
        let added = new_lines.len();
        data.commands.extend(
            new_lines
                .into_iter()
                .zip(1u32..)
                .map(|(code, offset)| CommandEntry::new(code, base_order + offset)),
        );

        if let Some(description) = description {
            data.metadata.description = Some(description);
        }
        if let Some(tags) = tags {
            data.metadata.tags = tags;
        }
        data.metadata.updated_at = Some(timestamp::now_utc());
        data.stats.total_commands = data.commands.len();

        self.repository.update(&data)?;

        let total = data.commands.len();
        tracker.load_commands(data.commands);
        tracker.set_session_start_line(self.history.line_count());

        tracing::info!(
            "[SessionUpdater] Added {} command(s) to '{}' ({} total)",
            added,
            name,
            total
        );
        Ok(UpdateOutcome::Updated { name, added, total })
    }
}
