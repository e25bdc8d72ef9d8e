//! Optional free-text session description.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TailorError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct SessionDescription(String);

impl SessionDescription {
    pub const MAX_LENGTH: usize = 500;

    /// Validates a description. Blank input is not an error here; use
    /// [`SessionDescription::from_optional`] when blank should mean "absent".
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(TailorError::validation("Session description is too long"));
        }
        Ok(Self(value))
    }

    /// Returns `Ok(None)` for missing, empty or whitespace-only input.
    pub fn from_optional(value: Option<&str>) -> Result<Option<Self>> {
        match value {
            Some(v) if !v.trim().is_empty() => Self::new(v).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SessionDescription> for String {
    fn from(description: SessionDescription) -> Self {
        description.0
    }
}

/// Serde helper for `Option<SessionDescription>` fields: `null`, `""` and
/// whitespace all read back as `None`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> std::result::Result<Option<SessionDescription>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    SessionDescription::from_optional(raw.as_deref()).map_err(serde::de::Error::custom)
}
