//! Model request/response types
//!
//! These types model the Gemini `generateContent` API closely enough to map
//! one-to-one onto the wire format, while keeping the rest of the crate free
//! of provider JSON.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a model message
    pub fn model(text: impl Into<String>) -> Self {
        debug!("Message::model: called");
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// How the model should shape its answer
///
/// Structured output and search grounding cannot be combined on a single
/// call, so they are separate variants rather than independent flags.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseMode {
    /// Free text
    Text,

    /// JSON matching the given response schema
    Structured { schema: serde_json::Value },

    /// Free text grounded on web search, with citations
    Grounded,
}

/// A generation request - everything needed for one model call
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// System instruction (rendered from a prompt template)
    pub system_instruction: String,

    /// Conversation so far, ending with the turn to answer
    pub contents: Vec<Message>,

    /// Output shaping for this call
    pub mode: ResponseMode,
}

impl GenerateRequest {
    /// Plain text request
    pub fn text(system_instruction: impl Into<String>, contents: Vec<Message>) -> Self {
        debug!(contents_len = contents.len(), "GenerateRequest::text: called");
        Self {
            system_instruction: system_instruction.into(),
            contents,
            mode: ResponseMode::Text,
        }
    }

    /// Schema-constrained JSON request
    pub fn structured(system_instruction: impl Into<String>, contents: Vec<Message>, schema: serde_json::Value) -> Self {
        debug!(contents_len = contents.len(), "GenerateRequest::structured: called");
        Self {
            system_instruction: system_instruction.into(),
            contents,
            mode: ResponseMode::Structured { schema },
        }
    }

    /// Search-grounded request
    pub fn grounded(system_instruction: impl Into<String>, contents: Vec<Message>) -> Self {
        debug!(contents_len = contents.len(), "GenerateRequest::grounded: called");
        Self {
            system_instruction: system_instruction.into(),
            contents,
            mode: ResponseMode::Grounded,
        }
    }

    /// Text of the last user turn (what is being asked right now)
    pub fn last_user_text(&self) -> Option<&str> {
        self.contents
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text.as_str())
    }
}

/// A citation returned alongside a grounded answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingSource {
    pub title: Option<String>,
    pub uri: String,
}

impl GroundingSource {
    pub fn new(title: Option<&str>, uri: impl Into<String>) -> Self {
        Self {
            title: title.map(str::to_string),
            uri: uri.into(),
        }
    }
}

/// Response from a generation request
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Concatenated answer text (if any)
    pub text: Option<String>,

    /// Citations from grounding metadata, in the order returned
    pub grounding: Vec<GroundingSource>,

    /// Why the model stopped
    pub finish_reason: FinishReason,

    /// Token usage for the call
    pub usage: TokenUsage,
}

impl GenerateResponse {
    /// Text-only response, mostly for tests and mocks
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Text that is present and not just whitespace
    pub fn non_blank_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FinishReason {
    #[default]
    Stop,
    MaxTokens,
    Safety,
    Other(String),
}

impl FinishReason {
    /// Parse from Gemini `finishReason`
    pub fn from_gemini(s: &str) -> Self {
        debug!(%s, "FinishReason::from_gemini: called");
        match s {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => FinishReason::Safety,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// Token usage reported by the service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub candidates_tokens: u64,
    pub total_tokens: u64,
}

/// Streaming chunk for incremental display
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// Text being generated
    TextDelta(String),

    /// Response complete with final stats
    Done { finish_reason: FinishReason, usage: TokenUsage },

    /// Error during streaming
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text, "Hello");

        let msg = Message::model("Namaste");
        assert_eq!(msg.role, Role::Model);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
        assert_eq!(serde_json::to_value(Role::Model).unwrap(), "model");
    }

    #[test]
    fn test_last_user_text() {
        let req = GenerateRequest::text(
            "sys",
            vec![Message::user("first"), Message::model("reply"), Message::user("second")],
        );
        assert_eq!(req.last_user_text(), Some("second"));

        let req = GenerateRequest::text("sys", vec![]);
        assert_eq!(req.last_user_text(), None);
    }

    #[test]
    fn test_modes() {
        let req = GenerateRequest::grounded("sys", vec![Message::user("news")]);
        assert_eq!(req.mode, ResponseMode::Grounded);

        let schema = serde_json::json!({"type": "OBJECT"});
        let req = GenerateRequest::structured("sys", vec![], schema.clone());
        assert_eq!(req.mode, ResponseMode::Structured { schema });
    }

    #[test]
    fn test_non_blank_text() {
        assert_eq!(GenerateResponse::from_text("hi").non_blank_text(), Some("hi"));
        assert_eq!(GenerateResponse::from_text("  \n").non_blank_text(), None);
        assert_eq!(GenerateResponse::default().non_blank_text(), None);
    }

    #[test]
    fn test_finish_reason_from_gemini() {
        assert_eq!(FinishReason::from_gemini("STOP"), FinishReason::Stop);
        assert_eq!(FinishReason::from_gemini("MAX_TOKENS"), FinishReason::MaxTokens);
        assert_eq!(FinishReason::from_gemini("SAFETY"), FinishReason::Safety);
        assert_eq!(
            FinishReason::from_gemini("MALFORMED_FUNCTION_CALL"),
            FinishReason::Other("MALFORMED_FUNCTION_CALL".to_string())
        );
    }
}
