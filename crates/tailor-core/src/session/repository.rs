//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::{SessionData, SessionMetadata, SessionSummary};
use super::name::SessionName;
use super::tag::SessionTag;
use super::tracker::SessionTracker;
use crate::error::Result;

/// Where the sessions are being recorded, stamped onto every saved document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEnvironment {
    pub project_path: String,
    pub interpreter_version: Option<String>,
    pub runtime_version: Option<String>,
}

impl SessionEnvironment {
    pub fn new(project_path: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            interpreter_version: None,
            runtime_version: None,
        }
    }

    pub fn with_interpreter_version(mut self, version: Option<String>) -> Self {
        self.interpreter_version = version;
        self
    }

    pub fn with_runtime_version(mut self, version: Option<String>) -> Self {
        self.runtime_version = version;
        self
    }
}

/// An abstract repository for managing session persistence.
///
/// Implementations store one whole document per session, keyed by its name.
/// Documents are never partially updated.
pub trait SessionRepository: Send + Sync {
    /// Whether a session with this name is stored.
    fn exists(&self, name: &SessionName) -> Result<bool>;

    /// Projects the tracker into a document and writes it under `metadata.name`.
    ///
    /// An existing document's `created_at` is carried forward; `updated_at` is
    /// always set to now.
    ///
    /// # Returns
    ///
    /// - `Ok(SessionData)`: the document as written
    /// - `Err(_)`: serialization or write failure
    fn save(&self, metadata: &SessionMetadata, tracker: &SessionTracker) -> Result<SessionData>;

    /// Reads a stored session.
    ///
    /// # Returns
    ///
    /// - `Ok(SessionData)`: session found
    /// - `Err(TailorError::NotFound)`: no such session
    /// - `Err(TailorError::Corrupt)`: the document could not be parsed
    fn load(&self, name: &SessionName) -> Result<SessionData>;

    /// Overwrites an existing document. Fails with `NotFound` when absent.
    fn update(&self, data: &SessionData) -> Result<()>;

    /// Summaries of all readable sessions carrying every tag in `filter_tags`,
    /// newest `updated_at` first.
    fn list(&self, filter_tags: &[SessionTag]) -> Result<Vec<SessionSummary>>;

    /// Removes a stored session. Fails with `NotFound` when absent.
    fn delete(&self, name: &SessionName) -> Result<bool>;
}
