//! JSON-file SessionRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use tailor_core::session::{
    SessionData, SessionEnvironment, SessionMetadata, SessionName, SessionRepository,
    SessionSummary, SessionTag, SessionTracker,
};
use tailor_core::{Result, TailorError};

use crate::storage::AtomicJsonFile;

const EXTENSION: &str = "json";

/// Stores each session as `<sessions_dir>/<name>.json`.
///
/// ```text
/// sessions_dir/
/// ├── api-debugging.json
/// └── session-auto-saved-2024-06-01-120000.json
/// ```
pub struct JsonSessionRepository {
    sessions_dir: PathBuf,
    environment: SessionEnvironment,
}

impl JsonSessionRepository {
    /// Creates the repository, creating `sessions_dir` if needed.
    pub fn new(sessions_dir: impl AsRef<Path>, environment: SessionEnvironment) -> Result<Self> {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        fs::create_dir_all(&sessions_dir).map_err(|e| {
            TailorError::io(format!(
                "Failed to create sessions directory {}: {}",
                sessions_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            sessions_dir,
            environment,
        })
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    pub fn environment(&self) -> &SessionEnvironment {
        &self.environment
    }

    /// The validated name is already a bare basename; only the suffix is added here.
    fn session_file(&self, name: &SessionName) -> AtomicJsonFile<SessionData> {
        AtomicJsonFile::new(
            self.sessions_dir
                .join(format!("{}.{}", name.as_str(), EXTENSION)),
        )
    }

    fn read(&self, name: &SessionName, file: &AtomicJsonFile<SessionData>) -> Result<SessionData> {
        file.load().map_err(|e| match e {
            TailorError::Serialization { message, .. } => {
                TailorError::corrupt(name.as_str(), message)
            }
            other => other,
        })
    }

    fn write(&self, data: &SessionData) -> Result<()> {
        self.session_file(data.name())
            .save(data)
            .map_err(|e| TailorError::storage(data.name().as_str(), e.to_string()))
    }

    fn stamp(&self, metadata: &SessionMetadata) -> SessionMetadata {
        let mut metadata = metadata.clone();
        if self.environment.interpreter_version.is_some() {
            metadata.interpreter_version = self.environment.interpreter_version.clone();
        }
        if self.environment.runtime_version.is_some() {
            metadata.runtime_version = self.environment.runtime_version.clone();
        }
        metadata
    }

    fn read_summary(path: &Path) -> Option<SessionSummary> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("[SessionStore] Skipping unreadable {:?}: {}", path, e);
                return None;
            }
        };
        match serde_json::from_str::<SessionData>(&content) {
            Ok(data) => Some(data.summary()),
            Err(e) => {
                tracing::warn!("[SessionStore] Skipping corrupt {:?}: {}", path, e);
                None
            }
        }
    }
}

impl SessionRepository for JsonSessionRepository {
    fn exists(&self, name: &SessionName) -> Result<bool> {
        Ok(self.session_file(name).exists())
    }

    fn save(&self, metadata: &SessionMetadata, tracker: &SessionTracker) -> Result<SessionData> {
        let name = &metadata.name;
        let data = self
            .session_file(name)
            .save_with(|current| {
                // An overwrite keeps the original creation time.
                let previous_created_at = match current {
                    Some(Ok(existing)) => existing.metadata.created_at,
                    Some(Err(e)) => {
                        tracing::warn!(
                            "[SessionStore] Overwriting unreadable session '{}': {}",
                            name,
                            e
                        );
                        None
                    }
                    None => None,
                };
                let metadata = self
                    .stamp(metadata)
                    .with_created_at(previous_created_at.or(metadata.created_at));
                Ok(SessionData::from_tracker(
                    metadata,
                    tracker,
                    &self.environment.project_path,
                ))
            })
            .map_err(|e| TailorError::storage(name.as_str(), e.to_string()))?;

        tracing::info!(
            "[SessionStore] Saved session '{}' ({} commands)",
            data.name(),
            data.command_count()
        );
        Ok(data)
    }

    fn load(&self, name: &SessionName) -> Result<SessionData> {
        let file = self.session_file(name);
        if !file.exists() {
            return Err(TailorError::session_not_found(name.as_str()));
        }
        let data = self.read(name, &file)?;
        tracing::debug!("[SessionStore] Loaded session '{}'", name);
        Ok(data)
    }

    fn update(&self, data: &SessionData) -> Result<()> {
        if !self.exists(data.name())? {
            return Err(TailorError::session_not_found(data.name().as_str()));
        }
        self.write(data)?;
        tracing::info!(
            "[SessionStore] Updated session '{}' ({} commands)",
            data.name(),
            data.command_count()
        );
        Ok(())
    }

    fn list(&self, filter_tags: &[SessionTag]) -> Result<Vec<SessionSummary>> {
        let entries = match fs::read_dir(&self.sessions_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries: Vec<SessionSummary> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION)
            })
            .filter_map(|path| Self::read_summary(&path))
            .filter(|summary| {
                filter_tags
                    .iter()
                    .all(|tag| summary.tags.iter().any(|t| t == tag.as_str()))
            })
            .collect();

        // Canonical timestamps compare correctly as strings; undated sessions sort last.
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    fn delete(&self, name: &SessionName) -> Result<bool> {
        let file = self.session_file(name);
        if !file.exists() {
            return Err(TailorError::session_not_found(name.as_str()));
        }
        file.remove()?;
        tracing::info!("[SessionStore] Deleted session '{}'", name);
        Ok(true)
    }
}
