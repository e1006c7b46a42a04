//! Error types for Djobea
//!
//! Store operations (notifications, shortcuts, stats) are total and never
//! fail. Errors only arise at the edges: parsing configuration and shortcut
//! text, talking to sockets, and serializing payloads.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Djobea operations
#[derive(Error, Debug)]
pub enum DjobeaError {
    /// I/O error with path context
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Shortcut text could not be parsed into a key combination
    #[error("Invalid shortcut '{combo}': {reason}")]
    InvalidShortcut { combo: String, reason: String },

    /// Unknown permission name
    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    /// Unknown role name
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Network connection error
    #[error("Connection error to '{addr}': {message}")]
    ConnectionError { addr: String, message: String },

    /// Malformed HTTP request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DjobeaError>,
    },
}

impl DjobeaError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a shortcut parse error
    pub fn invalid_shortcut(combo: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidShortcut {
            combo: combo.into(),
            reason: reason.into(),
        }
    }

    /// Create a connection error
    pub fn connection(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionError {
            addr: addr.into(),
            message: message.into(),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Short title used when the error is surfaced as a notification
    pub fn title(&self) -> &'static str {
        match self {
            Self::Io { .. } => "I/O error",
            Self::ConfigError(_) => "Configuration error",
            Self::InvalidShortcut { .. } => "Invalid shortcut",
            Self::UnknownPermission(_) | Self::UnknownRole(_) => "Access error",
            Self::ConnectionError { .. } => "Connection error",
            Self::BadRequest(_) => "Bad request",
            Self::Json(_) => "Data error",
            Self::WithContext { source, .. } => source.title(),
        }
    }

    /// Check if retrying the operation could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { .. } | Self::ConnectionError { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Result type alias for Djobea operations
pub type Result<T> = std::result::Result<T, DjobeaError>;

impl From<std::io::Error> for DjobeaError {
    fn from(err: std::io::Error) -> Self {
        DjobeaError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| DjobeaError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Result<()> = Err(io_err).with_path("/etc/djobea.json");
        match err {
            Err(DjobeaError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("/etc/djobea.json"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_recoverability() {
        assert!(DjobeaError::connection("127.0.0.1:8080", "refused").is_recoverable());
        assert!(!DjobeaError::config("bad port").is_recoverable());

        let wrapped = DjobeaError::connection("a", "b").with_context("starting server");
        assert!(wrapped.is_recoverable());
        assert_eq!(wrapped.title(), "Connection error");
    }

    #[test]
    fn test_display() {
        let err = DjobeaError::invalid_shortcut("ctrl+", "missing key");
        assert_eq!(err.to_string(), "Invalid shortcut 'ctrl+': missing key");
    }
}
