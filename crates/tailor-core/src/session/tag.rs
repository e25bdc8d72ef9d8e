//! Session tags and tag collections.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::name::IDENTIFIER_PATTERN;
use crate::error::{Result, TailorError};

/// A tag attached to a session. Normalized to trimmed lowercase before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionTag(String);

impl SessionTag {
    pub const MAX_LENGTH: usize = 50;

    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let value = value.as_ref().trim().to_lowercase();

        if value.is_empty() {
            return Err(TailorError::validation("Tag cannot be empty"));
        }

        if !IDENTIFIER_PATTERN.is_match(&value) {
            return Err(TailorError::validation(
                "Tag must contain only alphanumeric characters, hyphens, and underscores",
            ));
        }

        if value.chars().count() > Self::MAX_LENGTH {
            return Err(TailorError::validation(format!(
                "Tag cannot exceed {} characters",
                Self::MAX_LENGTH
            )));
        }

        Ok(Self(value))
    }

    /// Parses every raw value, failing on the first invalid one.
    pub fn parse_all<I, S>(values: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values.into_iter().map(Self::new).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionTag {
    type Error = TailorError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SessionTag> for String {
    fn from(tag: SessionTag) -> Self {
        tag.0
    }
}

/// An ordered set of at most [`SessionTags::MAX_TAGS`] unique tags.
///
/// Duplicates collapse silently; going over the cap is an error.
/// `add` and `remove` return new collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SessionTags(Vec<SessionTag>);

impl SessionTags {
    pub const MAX_TAGS: usize = 10;

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_tags(SessionTag::parse_all(values)?)
    }

    pub fn from_tags(tags: Vec<SessionTag>) -> Result<Self> {
        let mut unique: Vec<SessionTag> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }

        if unique.len() > Self::MAX_TAGS {
            return Err(TailorError::validation(format!(
                "Cannot exceed {} tags",
                Self::MAX_TAGS
            )));
        }

        Ok(Self(unique))
    }

    pub fn add(&self, tags: &[SessionTag]) -> Result<Self> {
        let mut merged = self.0.clone();
        merged.extend(tags.iter().cloned());
        Self::from_tags(merged)
    }

    pub fn remove(&self, tags: &[SessionTag]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|tag| !tags.contains(tag))
                .cloned()
                .collect(),
        )
    }

    pub fn contains(&self, tag: &SessionTag) -> bool {
        self.0.contains(tag)
    }

    pub fn has_all(&self, tags: &[SessionTag]) -> bool {
        tags.iter().all(|tag| self.contains(tag))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionTag> {
        self.0.iter()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|t| t.0.clone()).collect()
    }

    /// Comma separated, for display.
    pub fn joined(&self) -> String {
        self.to_strings().join(", ")
    }
}

impl TryFrom<Vec<String>> for SessionTags {
    type Error = TailorError;

    fn try_from(values: Vec<String>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<SessionTags> for Vec<String> {
    fn from(tags: SessionTags) -> Self {
        tags.0.into_iter().map(String::from).collect()
    }
}
