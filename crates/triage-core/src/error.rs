//! Error types for the Triage client.

use thiserror::Error;

/// A shared error type for the entire Triage client.
///
/// Network and upstream failures are recovered inside the conversation
/// controller (they become apology messages). The remaining variants are
/// precondition violations that the caller is expected to handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriageError {
    /// The upstream service could not be reached
    #[error("Transport error: {message}")]
    Transport { message: String, is_retryable: bool },

    /// The upstream service answered with a non-success status
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Message template could not be rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Required launch context is absent (service, user type)
    #[error("Missing session context: {0}")]
    MissingContext(&'static str),

    /// Blank text or an empty image payload
    #[error("Nothing to send: {0} is empty")]
    EmptyInput(&'static str),

    /// A turn is already in flight
    #[error("A message is already being sent")]
    SendInProgress,

    /// The operation is not valid in the current conversation state
    #[error("Invalid conversation state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The conversation has been terminated
    #[error("Conversation terminated")]
    Terminated,
}

impl TriageError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>, is_retryable: bool) -> Self {
        Self::Transport {
            message: message.into(),
            is_retryable,
        }
    }

    /// Creates an Upstream error
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidState error
    pub fn invalid_state(expected: &'static str, actual: impl std::fmt::Display) -> Self {
        Self::InvalidState {
            expected,
            actual: actual.to_string(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error came from talking to the upstream service
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Upstream { .. })
    }

    /// Check if retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { is_retryable, .. } => *is_retryable,
            Self::Upstream { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the send guard rejected the call
    pub fn is_send_in_progress(&self) -> bool {
        matches!(self, Self::SendInProgress)
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for TriageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TriageError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for TriageError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<minijinja::Error> for TriageError {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}

/// A type alias for `Result<T, TriageError>`.
pub type Result<T> = std::result::Result<T, TriageError>;
