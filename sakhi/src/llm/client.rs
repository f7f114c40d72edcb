//! ModelClient trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{GenerateRequest, GenerateResponse, LlmError, StreamChunk};

/// Stateless model client - each call carries its full context
///
/// Conversation memory lives with the caller (see `chat::ChatSession`),
/// which resends the transcript on every turn.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a single generation request and wait for the full answer
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError>;

    /// Streaming generation for incremental display
    ///
    /// Sends chunks to the provided channel as they arrive.
    /// Returns the final complete response.
    async fn stream(
        &self,
        request: GenerateRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<GenerateResponse, LlmError>;
}
