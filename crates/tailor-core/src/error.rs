//! Error types for Tailor.

use thiserror::Error;

/// A shared error type for the whole session engine.
///
/// Validation and not-found conditions are kept apart from storage failures so the
/// command surface can map each of them to its own user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TailorError {
    /// A value object rejected its input. The message is the failing rule.
    #[error("{0}")]
    Validation(String),

    /// Entity not found error with type information
    #[error("{entity_type} '{id}' does not exist.")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A stored document exists but could not be parsed.
    #[error("Failed to decode session '{name}': {message}")]
    Corrupt { name: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Writing a session document failed.
    #[error("Failed to write session '{name}': {message}")]
    Storage { name: String, message: String },

    /// `update` was requested while no session is loaded in the shell.
    #[error("No session is currently loaded.")]
    NoSessionLoaded,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A replayed or typed command was rejected by the interpreter.
    #[error("{0}")]
    Interpreter(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TailorError {
    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a NotFound error for a session
    pub fn session_not_found(name: impl Into<String>) -> Self {
        Self::not_found("Session", name)
    }

    pub fn corrupt(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn storage(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a corrupt-document error
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for TailorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TailorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TailorError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TailorError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, TailorError>`.
pub type Result<T> = std::result::Result<T, TailorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_is_user_facing() {
        let err = TailorError::session_not_found("demo");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Session 'demo' does not exist.");
    }

    #[test]
    fn test_validation_message_is_the_rule() {
        let err = TailorError::validation("Tag cannot be empty");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Tag cannot be empty");
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: TailorError = io.into();
        assert!(err.is_io());
        assert!(err.to_string().contains("PermissionDenied"));
    }
}
