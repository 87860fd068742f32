//! Error types for radgate

use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shared secret could not be loaded
    #[error("Secret error: {0}")]
    Secret(String),

    /// Upstream address could not be resolved
    #[error("Unable to resolve {0}")]
    Resolve(String),

    /// Plugin setup or dispatch failed
    #[error("Plugin error: {0}")]
    Plugin(String),

    /// Wire protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelayError::Secret("no secret found".to_string());
        assert!(err.to_string().contains("no secret found"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::other("test");
        let relay_err: RelayError = io_err.into();
        assert!(matches!(relay_err, RelayError::Io(_)));
    }
}
