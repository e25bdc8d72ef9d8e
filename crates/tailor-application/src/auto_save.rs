//! Periodic background saving of the live session.

use std::sync::Arc;

use chrono::Local;
use tailor_core::config::AutoSaveConfig;
use tailor_core::history::HistoryReader;
use tailor_core::session::{
    SessionDescription, SessionMetadata, SessionName, SessionRepository, SessionTags,
    SessionTracker,
};
use tailor_core::Result;

pub const AUTO_SAVE_PREFIX: &str = "session-auto-saved-";
pub const AUTO_SAVE_DESCRIPTION: &str = "Auto-saved session";
pub const AUTO_SAVE_TAG: &str = "auto-saved";

/// Saves the live session under one generated name, once the command count or
/// the session age crosses the configured thresholds.
///
/// The name is generated on the first save and reused for the rest of the
/// process, so one shell run produces one rolling file.
pub struct AutoSaveController {
    repository: Arc<dyn SessionRepository>,
    history: HistoryReader,
    config: AutoSaveConfig,
    saved_as: Option<SessionName>,
}

impl AutoSaveController {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        history: HistoryReader,
        config: AutoSaveConfig,
    ) -> Self {
        Self {
            repository,
            history,
            config,
            saved_as: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// The name used so far, if anything was saved.
    pub fn saved_as(&self) -> Option<&SessionName> {
        self.saved_as.as_ref()
    }

    /// Runs after every shell cycle. Never fails: errors are logged.
    ///
    /// Returns the session name when a save happened.
    pub fn on_idle(&mut self, tracker: &mut SessionTracker) -> Option<SessionName> {
        if !self.should_save(tracker) {
            return None;
        }
        match self.save(tracker) {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("[AutoSave] Auto-save failed: {}", e);
                None
            }
        }
    }

    /// Refreshes the tracker from history and checks the thresholds.
    pub fn should_save(&self, tracker: &mut SessionTracker) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.history.capture_into_tracker(tracker);

        tracker.command_count() >= self.config.min_commands
            || tracker.duration_seconds() >= self.config.interval_seconds
    }

    fn save(&mut self, tracker: &SessionTracker) -> Result<Option<SessionName>> {
        if !tracker.has_commands() {
            return Ok(None);
        }

        let name = match &self.saved_as {
            Some(name) => name.clone(),
            None => {
                let name = generate_name()?;
                self.saved_as = Some(name.clone());
                name
            }
        };

        let metadata = SessionMetadata::new(name.clone())
            .with_description(Some(SessionDescription::new(AUTO_SAVE_DESCRIPTION)?))
            .with_tags(SessionTags::new([AUTO_SAVE_TAG])?);

        self.repository.save(&metadata, tracker)?;
        tracing::info!(
            "[AutoSave] Saved {} command(s) as '{}'",
            tracker.command_count(),
            name
        );
        Ok(Some(name))
    }
}

fn generate_name() -> Result<SessionName> {
    SessionName::new(format!(
        "{AUTO_SAVE_PREFIX}{}",
        Local::now().format("%Y-%m-%d-%H%M%S")
    ))
}
