//! Error types for medrag.

use thiserror::Error;

/// Library-level error type for medrag operations.
#[derive(Error, Debug)]
pub enum MedragError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Video source error: {0}")]
    VideoSource(String),

    #[error("Transcript not available for this video.")]
    TranscriptUnavailable,

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Entity extraction failed: {0}")]
    EntityExtraction(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl MedragError {
    /// Whether the error was caused by the caller rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MedragError::InvalidInput(_) | MedragError::TranscriptUnavailable
        )
    }
}

/// Result type alias for medrag operations.
pub type Result<T> = std::result::Result<T, MedragError>;
