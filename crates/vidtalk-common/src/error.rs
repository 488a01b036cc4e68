//! Error types shared by VidTalk crates

use thiserror::Error;

/// Result type alias for VidTalk operations
pub type Result<T> = std::result::Result<T, VidtalkError>;

/// Errors that are not tied to a single feature
#[derive(Error, Debug)]
pub enum VidtalkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

impl VidtalkError {
    /// Shorthand for a [`VidtalkError::Config`]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
