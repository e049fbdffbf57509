//! Transcription port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Transcription errors
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Empty transcription response")]
    EmptyResponse,

    #[error("Failed to read recording: {0}")]
    ReadFailed(String),

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

/// Port for turning a voice recording into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a recording file.
    ///
    /// # Arguments
    /// * `recording` - Path of the encoded recording
    ///
    /// # Returns
    /// The transcribed text or an error
    async fn transcribe(&self, recording: &Path) -> Result<String, TranscriptionError>;
}
