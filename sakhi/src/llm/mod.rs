//! Model client module for Arth Sakhi
//!
//! Provides the transport-level client trait, the Gemini implementation
//! and the request/response types shared by the gateway and chat sessions.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod gemini;
mod types;

pub use client::ModelClient;
pub use error::{ErrorKind, LlmError};
pub use gemini::GeminiClient;
pub use types::{
    FinishReason, GenerateRequest, GenerateResponse, GroundingSource, Message, ResponseMode, Role, StreamChunk,
    TokenUsage,
};

use crate::config::LlmConfig;

/// Create a model client based on the provider specified in config
///
/// Fails with `LlmError::Config` when the credential is missing, before any
/// network traffic.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn ModelClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    Ok(Arc::new(GeminiClient::from_config(config)?))
}
