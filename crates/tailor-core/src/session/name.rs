//! Validated session name.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TailorError};

pub(crate) static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern is valid"));

/// The name a session is saved under.
///
/// Only `[A-Za-z0-9_-]` is accepted, so a name can never contain a path separator
/// or `..` and is safe to use as a file basename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionName(String);

impl SessionName {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(TailorError::validation("Session name cannot be empty"));
        }

        if !IDENTIFIER_PATTERN.is_match(&value) {
            return Err(TailorError::validation(
                "Session name must contain only alphanumeric characters, hyphens, and underscores",
            ));
        }

        Ok(Self(value))
    }

    /// Like [`SessionName::new`], but blank input yields `Ok(None)`.
    pub fn from_optional(value: Option<&str>) -> Result<Option<Self>> {
        match value {
            Some(v) if !v.trim().is_empty() => Self::new(v).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionName {
    type Error = TailorError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SessionName> for String {
    fn from(name: SessionName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_identifier_characters() {
        let name = SessionName::new("api-debug_2024").unwrap();
        assert_eq!(name.as_str(), "api-debug_2024");
        assert_eq!(name.to_string(), "api-debug_2024");
    }

    #[test]
    fn test_rejects_empty() {
        let err = SessionName::new("").unwrap_err();
        assert_eq!(err.to_string(), "Session name cannot be empty");
        assert!(SessionName::new("   ").is_err());
    }

    #[test]
    fn test_rejects_path_traversal() {
        for bad in ["../etc", "a/b", "..", "name.json", "with space", "semi;colon"] {
            let err = SessionName::new(bad).unwrap_err();
            assert!(err.is_validation(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_from_optional() {
        assert_eq!(SessionName::from_optional(None).unwrap(), None);
        assert_eq!(SessionName::from_optional(Some("  ")).unwrap(), None);
        assert!(SessionName::from_optional(Some("ok")).unwrap().is_some());
        assert!(SessionName::from_optional(Some("not ok")).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: SessionName = serde_json::from_str("\"demo\"").unwrap();
        assert_eq!(ok.as_str(), "demo");
        assert!(serde_json::from_str::<SessionName>("\"../demo\"").is_err());
    }
}
