//! Error types for malheur

use thiserror::Error;

/// Result type alias for malheur operations
pub type Result<T> = std::result::Result<T, MalheurError>;

/// Error types that can occur while hashing, computing kernels or extracting prototypes
///
/// Every variant aborts the current task. Nothing is retried or skipped, and
/// no partial result is written when one of these is returned.
#[derive(Error, Debug)]
pub enum MalheurError {
    /// Invalid configuration (threshold, dimension, scheme, missing outputs)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Allocation failure or memory ceiling exceeded
    #[error("Resource error: {0}")]
    Resource(String),

    /// Unreadable or malformed input
    #[error("Input error in {source_name}: {message}")]
    Input {
        /// Report, file or directory that failed
        source_name: String,
        /// What went wrong
        message: String,
    },

    /// Feature spaces of different dimension were mixed
    #[error("Dimension mismatch: expected {expected} bits, got {actual} bits")]
    DimensionMismatch {
        /// Dimension bits of the current feature space
        expected: u32,
        /// Dimension bits of the offending data
        actual: u32,
    },

    /// Saved data was hashed or normalized differently from the current space
    #[error("Feature space mismatch: expected {expected}, got {actual}")]
    FeatureSpaceMismatch {
        /// Setting of the current feature space
        expected: String,
        /// Setting recorded with the offending data
        actual: String,
    },

    /// An output file could not be written
    #[error("Cannot write {path}: {source}")]
    Write {
        /// Target path
        path: String,
        /// Underlying failure
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MalheurError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a resource error
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource(message.into())
    }

    /// Create an input error for the given source
    pub fn input(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Input {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// True for errors raised before any report is processed
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<serde_json::Error> for MalheurError {
    fn from(err: serde_json::Error) -> Self {
        MalheurError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for MalheurError {
    fn from(err: toml::de::Error) -> Self {
        MalheurError::Config(err.to_string())
    }
}

impl From<std::collections::TryReserveError> for MalheurError {
    fn from(err: std::collections::TryReserveError) -> Self {
        MalheurError::Resource(err.to_string())
    }
}
