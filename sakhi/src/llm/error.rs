//! Model gateway error types

use std::time::Duration;
use thiserror::Error;

use crate::prompts::PromptError;

/// Errors that can occur while talking to the model service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error class used for propagation decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential or broken local setup; nothing can proceed
    Config,
    /// The model answered, but not with something usable
    Generation,
    /// The request never produced an answer
    Network,
}

impl LlmError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Config(_) | LlmError::Prompt(_) => ErrorKind::Config,
            LlmError::Generation(_) | LlmError::Json(_) => ErrorKind::Generation,
            LlmError::Network(_) | LlmError::ApiError { .. } | LlmError::RateLimited { .. } | LlmError::Stream(_) => {
                ErrorKind::Network
            }
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status == 408 || *status >= 500,
            LlmError::Network(_) => true,
            LlmError::Stream(_) => true,
            LlmError::Config(_) | LlmError::Prompt(_) | LlmError::Generation(_) | LlmError::Json(_) => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
