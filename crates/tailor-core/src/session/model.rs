//! Session domain model.
//!
//! [`SessionData`] is the unit of storage: one document per session, always read
//! and written whole.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::description::{self, SessionDescription};
use super::name::SessionName;
use super::tag::SessionTags;
use super::tracker::SessionTracker;
use crate::timestamp;

/// One captured command.
///
/// `order` is assigned once at capture time and kept verbatim afterwards; it is
/// never recomputed from the position in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    /// Command text, possibly in a legacy history encoding
    pub code: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    pub order: u32,
}

impl CommandEntry {
    pub fn new(code: impl Into<String>, order: u32) -> Self {
        Self {
            code: code.into(),
            output: None,
            timestamp: timestamp::now(),
            order,
        }
    }
}

/// The highest `order` in a command list, or 0 when empty.
pub fn max_order(commands: &[CommandEntry]) -> u32 {
    commands.iter().map(|c| c.order).max().unwrap_or(0)
}

/// A type-tagged snapshot of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSnapshot {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// User-facing metadata of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub name: SessionName,
    #[serde(default, deserialize_with = "description::deserialize_optional")]
    pub description: Option<SessionDescription>,
    #[serde(default)]
    pub tags: SessionTags,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interpreter_version: Option<String>,
    #[serde(default)]
    pub runtime_version: Option<String>,
}

impl SessionMetadata {
    pub fn new(name: SessionName) -> Self {
        Self {
            name,
            description: None,
            tags: SessionTags::empty(),
            created_at: None,
            updated_at: None,
            interpreter_version: None,
            runtime_version: None,
        }
    }

    pub fn with_description(mut self, description: Option<SessionDescription>) -> Self {
        self.description = description;
        self
    }

    pub fn with_tags(mut self, tags: SessionTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sets `updated_at` to now and fills `created_at` if it was never set.
    pub fn touched(mut self) -> Self {
        let now = timestamp::now_utc();
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
        self
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }
}

/// Statistics derived from the tracker at save time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub total_commands: usize,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(default)]
    pub project_path: String,
    #[serde(default)]
    pub started_at: Option<String>,
}

/// A complete stored session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(flatten)]
    pub metadata: SessionMetadata,
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableSnapshot>,
    #[serde(rename = "metadata", default)]
    pub stats: SessionStats,
}

impl SessionData {
    /// Projects the live tracker into a storable document.
    pub fn from_tracker(
        metadata: SessionMetadata,
        tracker: &SessionTracker,
        project_path: impl Into<String>,
    ) -> Self {
        Self {
            metadata: metadata.touched(),
            commands: tracker.commands().to_vec(),
            variables: tracker.variables().clone(),
            stats: SessionStats {
                total_commands: tracker.command_count(),
                duration_seconds: tracker.duration_seconds(),
                project_path: project_path.into(),
                started_at: Some(timestamp::format(&tracker.started_at())),
            },
        }
    }

    pub fn name(&self) -> &SessionName {
        &self.metadata.name
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn has_variables(&self) -> bool {
        !self.variables.is_empty()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            name: self.metadata.name.clone(),
            description: self
                .metadata
                .description
                .as_ref()
                .map(|d| d.as_str().to_string()),
            tags: self.metadata.tags.to_strings(),
            created_at: self.metadata.created_at.as_ref().map(timestamp::format),
            updated_at: self.metadata.updated_at.as_ref().map(timestamp::format),
            command_count: if self.stats.total_commands > 0 {
                self.stats.total_commands
            } else {
                self.commands.len()
            },
            interpreter_version: self.metadata.interpreter_version.clone(),
        }
    }
}

/// One row of a session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub name: SessionName,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub command_count: usize,
    pub interpreter_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_DOCUMENT: &str = r#"{
        "name": "legacy",
        "description": "",
        "tags": ["API", "api"],
        "created_at": "2024-01-01 10:00:00",
        "updated_at": "2024-01-02T10:00:00+00:00",
        "commands": [
            {"code": "$a = 1", "output": null, "timestamp": "2024-01-01 10:00:01", "order": 1}
        ],
        "variables": {"a": {"type": "integer", "class": null, "value": "1"}},
        "metadata": {"total_commands": 1, "duration_seconds": 12, "project_path": "/srv/app", "started_at": null}
    }"#;

    #[test]
    fn test_reads_legacy_document() {
        let data: SessionData = serde_json::from_str(LEGACY_DOCUMENT).unwrap();
        assert_eq!(data.name().as_str(), "legacy");
        assert_eq!(data.metadata.description, None);
        assert_eq!(data.metadata.tags.to_strings(), vec!["api"]);
        assert_eq!(data.commands[0].order, 1);
        assert_eq!(data.variables["a"].kind, "integer");
        assert_eq!(data.stats.duration_seconds, 12);

        let summary = data.summary();
        assert_eq!(summary.created_at.as_deref(), Some("2024-01-01T10:00:00Z"));
        assert_eq!(summary.updated_at.as_deref(), Some("2024-01-02T10:00:00Z"));
        assert_eq!(summary.command_count, 1);
    }

    #[test]
    fn test_writes_flat_document() {
        let data: SessionData = serde_json::from_str(LEGACY_DOCUMENT).unwrap();
        let value = serde_json::to_value(&data).unwrap();

        for key in [
            "name",
            "description",
            "tags",
            "created_at",
            "updated_at",
            "interpreter_version",
            "runtime_version",
            "commands",
            "variables",
            "metadata",
        ] {
            assert!(value.get(key).is_some(), "missing top-level key {key}");
        }
        assert_eq!(value["created_at"], "2024-01-01T10:00:00Z");
        assert_eq!(value["metadata"]["project_path"], "/srv/app");
    }

    #[test]
    fn test_rejects_invalid_name() {
        let doc = LEGACY_DOCUMENT.replace("\"legacy\"", "\"../escape\"");
        assert!(serde_json::from_str::<SessionData>(&doc).is_err());
    }

    #[test]
    fn test_touched_keeps_created_at() {
        let created = timestamp::parse("2024-01-01T00:00:00Z");
        let metadata = SessionMetadata::new(SessionName::new("demo").unwrap())
            .with_created_at(created)
            .touched();
        assert_eq!(metadata.created_at, created);
        assert!(metadata.updated_at.unwrap() > created.unwrap());
    }

    #[test]
    fn test_touched_metadata_survives_serialization() {
        let metadata = SessionMetadata::new(SessionName::new("demo").unwrap()).touched();
        let json = serde_json::to_string(&metadata).unwrap();
        let read_back: SessionMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(read_back.created_at, metadata.created_at);
        assert_eq!(read_back.updated_at, metadata.updated_at);
    }

    #[test]
    fn test_max_order_ignores_position() {
        let commands = vec![CommandEntry::new("a", 7), CommandEntry::new("b", 3)];
        assert_eq!(max_order(&commands), 7);
        assert_eq!(max_order(&[]), 0);
    }
}
