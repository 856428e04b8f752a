//! Unified error types for the bustrack core library.
//!
//! [`TrackerError`] covers every failure mode the tracker can report. Most of
//! them are absorbed where they happen: a position report for a session that
//! already disconnected, or a broadcast to a subscriber whose queue is full,
//! is logged and dropped rather than surfaced to anyone.
//!
//! # Example
//!
//! ```rust
//! use bustrack_core::error::{Result, TrackerError};
//! use bustrack_core::SessionId;
//!
//! fn require_session(known: bool, id: &SessionId) -> Result<()> {
//!     if !known {
//!         return Err(TrackerError::UnknownSession(id.clone()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::types::SessionId;

/// The unified error type for all bustrack operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    // =========================================================================
    // SESSION ERRORS
    // =========================================================================
    /// No registry entry exists for the session. Expected when a disconnect
    /// races a position report.
    #[error("Unknown session: '{0}'. The publisher has not logged in or has already disconnected.")]
    UnknownSession(SessionId),

    /// An inbound frame could not be decoded as a protocol message.
    #[error("Malformed message: {0}")]
    MalformedInput(String),

    /// A message could not be queued for a subscriber because its outbound
    /// queue is full or its connection has closed.
    #[error("Subscriber '{0}' is unreachable (queue full or connection closed)")]
    SubscriberUnreachable(SessionId),

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {0}")]
    ConfigNotFound(String),

    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // I/O ERRORS
    // =========================================================================
    /// Encoding an outbound message failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for bustrack operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Returns `true` if this error represents an expected operational state
    /// that should be absorbed silently rather than reported.
    #[inline]
    #[must_use]
    pub const fn is_expected_state(&self) -> bool {
        matches!(self, Self::UnknownSession(_) | Self::SubscriberUnreachable(_))
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::MalformedInput(_) => 400,
            Self::UnknownSession(_) | Self::ConfigNotFound(_) => 404,
            Self::SubscriberUnreachable(_) => 410,
            Self::ConfigParseError(_) | Self::ConfigValidationError(_) => 422,
            Self::Serialization(_) | Self::IoError(_) => 500,
        }
    }

    /// Returns a machine-readable error code for API and wire responses.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSession(_) => "UNKNOWN_SESSION",
            Self::MalformedInput(_) => "MALFORMED_INPUT",
            Self::SubscriberUnreachable(_) => "SUBSCRIBER_UNREACHABLE",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<crate::config::ConfigError> for TrackerError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path),
            ConfigError::ParseError(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::LoadError(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::ValidationError { field, message } => {
                Self::ConfigValidationError(format!("{field}: {message}"))
            }
            ConfigError::MultipleValidationErrors(errors) => {
                let messages: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
                Self::ConfigValidationError(messages.join("; "))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
