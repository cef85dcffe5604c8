//! Error types for listening-history aggregation

use thiserror::Error;

/// Result type alias for scrobble-streams operations
pub type Result<T> = std::result::Result<T, ScrobbleError>;

/// Main error type for scrobble-streams operations
#[derive(Error, Debug)]
pub enum ScrobbleError {
    /// The log (or the slice handed to an operation) has no events, so no
    /// time extent can be derived
    #[error("Empty input: {message}")]
    EmptyInput { message: String },

    /// A source row could not be turned into an event; the whole load aborts
    #[error("Malformed event at row {row}: {message}")]
    MalformedEvent { row: usize, message: String },

    /// A degenerate or out-of-range selection. Recovered internally by
    /// clamping or defaulting, never surfaced by the selection window.
    #[error("Invalid selection: {message}")]
    InvalidSelection { message: String },

    /// Stacked layout and bucket sequence disagree
    #[error("Layout invariant violated: {message}")]
    LayoutInvariant { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScrobbleError {
    /// Create a new empty input error
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: msg.into(),
        }
    }

    /// Create a new malformed event error for a 1-based source row
    pub fn malformed(row: usize, msg: impl Into<String>) -> Self {
        Self::MalformedEvent {
            row,
            message: msg.into(),
        }
    }

    /// Create a new invalid selection error
    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection {
            message: msg.into(),
        }
    }

    /// Create a new layout invariant error
    pub fn layout_invariant(msg: impl Into<String>) -> Self {
        Self::LayoutInvariant {
            message: msg.into(),
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether the error stops a load outright (no chart can be produced)
    pub fn is_fatal_to_load(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput { .. } | Self::MalformedEvent { .. } | Self::Io(_) | Self::Serialization(_)
        )
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyInput { .. } => "empty_input",
            Self::MalformedEvent { .. } => "malformed_event",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::LayoutInvariant { .. } => "layout_invariant",
            Self::Config { .. } => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_event_display() {
        let err = ScrobbleError::malformed(3, "missing timestamp");
        assert_eq!(err.to_string(), "Malformed event at row 3: missing timestamp");
        assert_eq!(err.category(), "malformed_event");
        assert!(err.is_fatal_to_load());
    }

    #[test]
    fn test_selection_errors_are_not_fatal() {
        let err = ScrobbleError::invalid_selection("zero width");
        assert!(!err.is_fatal_to_load());
        assert_eq!(err.category(), "invalid_selection");
    }

    #[test]
    fn test_config_with_source_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ScrobbleError::config_with_source("could not read", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
