//! Unified error handling for the bridge.
//!
//! A single error type shared across all bridge crates keeps error
//! handling consistent without per-crate error enums.

/// Unified error type for the bridge.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// MQTT transport errors.
    #[error("MQTT error: {0}")]
    Mqtt(String),

    /// HTTP endpoint errors.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, Error>;
