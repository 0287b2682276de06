//! Error types for the tracker core

use thiserror::Error;

/// Main error type for database and configuration operations
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The adapter could not connect to the database
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Adapter name did not resolve to a known implementation
    #[error("Unknown database adapter: {0}")]
    UnknownAdapter(String),

    /// Setup file could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template context value could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<rusqlite::Error> for TrackerError {
    fn from(err: rusqlite::Error) -> Self {
        TrackerError::Database(err.to_string())
    }
}

impl From<toml::de::Error> for TrackerError {
    fn from(err: toml::de::Error) -> Self {
        TrackerError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TrackerError {
    fn from(err: toml::ser::Error) -> Self {
        TrackerError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackerError::Connection("unable to open database file".to_string());
        assert!(err.to_string().contains("unable to open"));

        let err = TrackerError::UnknownAdapter("PearAdapter".to_string());
        assert_eq!(err.to_string(), "Unknown database adapter: PearAdapter");
    }

    #[test]
    fn test_error_from_rusqlite() {
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let err: TrackerError = sqlite_err.into();
        match err {
            TrackerError::Database(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Database"),
        }
    }

    #[test]
    fn test_error_from_toml() {
        let toml_err = toml::from_str::<toml::Table>("[database").unwrap_err();
        let err: TrackerError = toml_err.into();
        assert!(matches!(err, TrackerError::Config(_)));
    }
}
