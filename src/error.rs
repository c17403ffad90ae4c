//! Error types for the attention engine

use thiserror::Error;

/// Error type for configuration, scenario and persistence operations.
///
/// Scoring and allocation never fail; they substitute defaults instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Scenario file could not be interpreted
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// Referenced component is not registered
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
