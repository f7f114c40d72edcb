//! Google Gemini API client implementation
//!
//! Implements the ModelClient trait for the `generateContent` REST endpoint
//! with support for both blocking and streaming (SSE) responses.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    FinishReason, GenerateRequest, GenerateResponse, GroundingSource, LlmError, Message, ModelClient, ResponseMode,
    StreamChunk, TokenUsage,
};
use crate::config::LlmConfig;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Upper bound on a single backoff delay
const MAX_BACKOFF_MS: u64 = 60_000;

/// Exponential delay before retry number `attempt` (1-based), capped
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(INITIAL_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// Rate limits carry their own delay; everything else backs off exponentially
fn retry_delay(error: &LlmError, attempt: u32) -> Duration {
    error.retry_after().unwrap_or_else(|| backoff_delay(attempt))
}

/// Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_retries: u32,
}

impl GeminiClient {
    /// Create a new client from configuration
    ///
    /// Resolves the API key up front so a missing credential fails here,
    /// before any request is attempted.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(provider = %config.provider, model = %config.model, "from_config: called");
        if config.provider != "gemini" {
            return Err(LlmError::Config(format!(
                "Unknown LLM provider: '{}'. Supported: gemini",
                config.provider
            )));
        }

        let api_key = config.get_api_key().map_err(|e| LlmError::Config(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    /// Build the request body for the Gemini API
    fn build_request_body(&self, request: &GenerateRequest) -> serde_json::Value {
        debug!(%self.model, mode = ?request.mode, "build_request_body: called");
        let mut body = serde_json::json!({
            "contents": self.convert_messages(&request.contents),
        });

        if !request.system_instruction.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": request.system_instruction }],
            });
        }

        match &request.mode {
            ResponseMode::Text => {
                debug!("build_request_body: text mode");
            }
            ResponseMode::Structured { schema } => {
                debug!("build_request_body: structured mode, adding response schema");
                body["generationConfig"] = serde_json::json!({
                    "responseMimeType": "application/json",
                    "responseSchema": schema,
                });
            }
            ResponseMode::Grounded => {
                debug!("build_request_body: grounded mode, adding google_search tool");
                body["tools"] = serde_json::json!([{ "google_search": {} }]);
            }
        }

        body
    }

    /// Convert internal Message types to Gemini `contents`
    fn convert_messages(&self, messages: &[Message]) -> Vec<serde_json::Value> {
        debug!(message_count = %messages.len(), "convert_messages: called");
        messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role,
                    "parts": [{ "text": msg.text }],
                })
            })
            .collect()
    }

    /// Parse a Gemini API response
    fn parse_response(&self, api_response: GeminiResponse) -> GenerateResponse {
        debug!(candidates = api_response.candidates.len(), "parse_response: called");
        let mut response = GenerateResponse::default();
        accumulate(&mut response, api_response);
        response
    }

    async fn backoff(&self, delay: Duration, attempt: u32, op: &str) {
        warn!(attempt, backoff_ms = delay.as_millis() as u64, op, "retrying after transient error");
        tokio::time::sleep(delay).await;
    }

    /// One `generateContent` round trip, with HTTP failures mapped to `LlmError`
    async fn generate_once(
        &self,
        url: &str,
        body: &serde_json::Value,
        attempt: u32,
    ) -> Result<GenerateResponse, LlmError> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", self.api_key.clone())
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| backoff_delay(attempt + 1));
            return Err(LlmError::RateLimited { retry_after });
        }

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let text = response.text().await?;
        let api_response: GeminiResponse = serde_json::from_str(&text)?;
        Ok(self.parse_response(api_response))
    }
}

/// Fold one response (or one streamed chunk) into the running response
fn accumulate(response: &mut GenerateResponse, api_response: GeminiResponse) {
    if let Some(usage) = api_response.usage_metadata {
        response.usage = TokenUsage {
            prompt_tokens: usage.prompt_token_count.unwrap_or(0),
            candidates_tokens: usage.candidates_token_count.unwrap_or(0),
            total_tokens: usage.total_token_count.unwrap_or(0),
        };
    }

    let Some(candidate) = api_response.candidates.into_iter().next() else {
        debug!("accumulate: no candidates");
        return;
    };

    if let Some(content) = candidate.content {
        for part in content.parts {
            if part.thought.unwrap_or(false) {
                continue;
            }
            if let Some(text) = part.text {
                response.text.get_or_insert_with(String::new).push_str(&text);
            }
        }
    }

    if let Some(metadata) = candidate.grounding_metadata {
        for chunk in metadata.grounding_chunks {
            match chunk.web {
                Some(GeminiWebChunk { uri: Some(uri), title }) => {
                    response.grounding.push(GroundingSource { title, uri });
                }
                _ => debug!("accumulate: skipping grounding chunk without web uri"),
            }
        }
    }

    if let Some(reason) = candidate.finish_reason {
        response.finish_reason = FinishReason::from_gemini(&reason);
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        debug!(%self.model, "generate: called");
        let url = self.endpoint("generateContent");
        let body = self.build_request_body(&request);

        let mut attempt = 0;
        loop {
            match self.generate_once(&url, &body, attempt).await {
                Ok(response) => {
                    debug!(attempt, "generate: success");
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    debug!(attempt, error = %e, "generate: retryable error");
                    attempt += 1;
                    self.backoff(retry_delay(&e, attempt), attempt, "generate").await;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "generate: giving up");
                    return Err(e);
                }
            }
        }
    }

    async fn stream(
        &self,
        request: GenerateRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<GenerateResponse, LlmError> {
        debug!(%self.model, "stream: called");
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let body = self.build_request_body(&request);

        let mut last_error = None;
        let mut es = None;

        // Retry loop for establishing the connection
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                self.backoff(backoff_delay(attempt), attempt, "stream").await;
            }

            let http_request = self
                .http
                .post(url.clone())
                .header("x-goog-api-key", self.api_key.clone())
                .header("content-type", "application/json")
                .json(&body);

            match EventSource::new(http_request) {
                Ok(event_source) => {
                    es = Some(event_source);
                    break;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "stream: EventSource creation failed");
                    last_error = Some(LlmError::Stream(e.to_string()));
                    continue;
                }
            }
        }

        let mut es = es.ok_or_else(|| {
            last_error.unwrap_or_else(|| LlmError::Stream("Failed to create EventSource".to_string()))
        })?;

        let mut response = GenerateResponse::default();

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("stream: Event::Open");
                }
                Ok(Event::Message(msg)) => {
                    debug!("stream: received Event::Message");
                    let chunk: GeminiResponse = serde_json::from_str(&msg.data)?;
                    let before = response.text.as_ref().map_or(0, String::len);
                    accumulate(&mut response, chunk);
                    if let Some(text) = &response.text
                        && text.len() > before
                    {
                        let _ = chunk_tx.send(StreamChunk::TextDelta(text[before..].to_string())).await;
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    debug!("stream: ended");
                    break;
                }
                Err(e) => {
                    debug!(%e, "stream: Event error");
                    es.close();
                    let _ = chunk_tx.send(StreamChunk::Error(e.to_string())).await;
                    return Err(LlmError::Stream(e.to_string()));
                }
            }
        }
        es.close();

        debug!("stream: complete");
        let _ = chunk_tx
            .send(StreamChunk::Done {
                finish_reason: response.finish_reason.clone(),
                usage: response.usage.clone(),
            })
            .await;

        Ok(response)
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiWebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GeminiClient {
        GeminiClient {
            model: "gemini-2.5-flash".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            http: Client::new(),
            max_retries: 3,
        }
    }

    #[test]
    fn test_endpoint() {
        let client = test_client();
        assert_eq!(
            client.endpoint("generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_build_request_body_text() {
        let client = test_client();
        let request = GenerateRequest::text("You are helpful", vec![Message::user("Hello")]);

        let body = client.build_request_body(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are helpful");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_body_structured() {
        let client = test_client();
        let schema = serde_json::json!({ "type": "OBJECT", "required": ["summary"] });
        let request = GenerateRequest::structured("sys", vec![Message::user("{}")], schema.clone());

        let body = client.build_request_body(&request);

        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"], schema);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_body_grounded_has_no_schema() {
        let client = test_client();
        let request = GenerateRequest::grounded("", vec![Message::user("news please")]);

        let body = client.build_request_body(&request);

        assert!(body["tools"][0].get("google_search").is_some());
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_build_request_body_chat_roles() {
        let client = test_client();
        let request = GenerateRequest::text(
            "sys",
            vec![Message::user("q1"), Message::model("a1"), Message::user("q2")],
        );

        let body = client.build_request_body(&request);
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
    }

    #[test]
    fn test_parse_response_with_grounding() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Repo rate " }, { "text": "unchanged." }] },
                "finishReason": "STOP",
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://a.example/1", "title": "RBI policy" } },
                        { "web": { "uri": "https://b.example/2" } },
                        { "retrievedContext": { "uri": "ignored" } }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15 }
        });
        let api_response: GeminiResponse = serde_json::from_value(raw).unwrap();

        let response = test_client().parse_response(api_response);

        assert_eq!(response.text.as_deref(), Some("Repo rate unchanged."));
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.total_tokens, 15);
        assert_eq!(
            response.grounding,
            vec![
                GroundingSource::new(Some("RBI policy"), "https://a.example/1"),
                GroundingSource::new(None, "https://b.example/2"),
            ]
        );
    }

    #[test]
    fn test_parse_response_skips_thoughts() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "thinking...", "thought": true }, { "text": "{\"a\":1}" }] }
            }]
        });
        let api_response: GeminiResponse = serde_json::from_value(raw).unwrap();

        let response = test_client().parse_response(api_response);
        assert_eq!(response.text.as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_parse_response_empty() {
        let api_response: GeminiResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        let response = test_client().parse_response(api_response);
        assert!(response.text.is_none());
        assert!(response.grounding.is_empty());
    }

    #[test]
    fn test_from_config_rejects_unknown_provider() {
        let config = LlmConfig {
            provider: "anthropic".to_string(),
            ..Default::default()
        };
        let result = GeminiClient::from_config(&config);
        assert!(matches!(result, Err(LlmError::Config(_))));
    }

    #[test]
    fn test_backoff_delay_doubles_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(4), Duration::from_millis(8000));
        assert_eq!(backoff_delay(7), Duration::from_millis(MAX_BACKOFF_MS));
        // large retry counts from config must not overflow
        assert_eq!(backoff_delay(65), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_retry_delay_honours_rate_limit() {
        let limited = LlmError::RateLimited {
            retry_after: Duration::from_secs(7),
        };
        assert_eq!(retry_delay(&limited, 1), Duration::from_secs(7));

        let unavailable = LlmError::ApiError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(retry_delay(&unavailable, 2), Duration::from_millis(2000));
    }
}
