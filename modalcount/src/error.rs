//! Error types for the road-user counting library

use thiserror::Error;

/// Result type alias for the counting library
pub type Result<T> = std::result::Result<T, CounterError>;

/// Errors raised while configuring or feeding the counting engine.
///
/// Per-frame processing never fails: a track whose filter misbehaves is
/// dropped inside the tracker instead of surfacing here.
#[derive(Error, Debug)]
pub enum CounterError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown road user class: {0}")]
    UnknownClass(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CounterError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }
}
