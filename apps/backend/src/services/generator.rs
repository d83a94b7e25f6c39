//! Flashcard generation through the Anthropic Messages API.
//!
//! Structured output is obtained by offering a single `record_flashcards`
//! tool and forcing the model to call it; the tool input is the flashcard
//! payload.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use flashcard_core::{FlashcardSet, QAItem, MAX_FLASHCARDS};

const TOOL_NAME: &str = "record_flashcards";

/// Longest provider `retry-after` hint that is honored as given.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Failure signals from the generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Overloaded(_))
    }
}

/// Source of generated flashcards.
#[async_trait]
pub trait FlashcardGenerator: Send + Sync {
    async fn generate(&self, notes: &str, topic: &str) -> Result<FlashcardSet, ProviderError>;
}

/// Configuration for the Anthropic adapter.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub api_version: String,
    pub max_tokens: u32,
}

impl AnthropicConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";
    pub const DEFAULT_MODEL: &'static str = "claude-sonnet-4-5-20250929";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            api_version: "2023-06-01".to_string(),
            max_tokens: 2048,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Build the prompt sent for one set of notes.
pub fn build_prompt(notes: &str, topic: &str) -> String {
    format!(
        "You are an experienced teacher writing flashcards for active recall practice.\n\
         \n\
         Topic: {topic}\n\
         \n\
         Study notes:\n\
         {notes}\n\
         \n\
         Write up to {MAX_FLASHCARDS} flashcards from these notes. Each question should \
         check understanding rather than rote memory, so prefer \"why\", \"how\" and \
         \"explain\" questions over yes/no questions. Cover the key ideas of the notes, \
         start with the fundamentals and build towards harder concepts, and give each \
         answer enough explanation to reinforce the idea.\n\
         \n\
         Record the flashcards with the {TOOL_NAME} tool."
    )
}

/// Build an Anthropic Messages API request body.
pub fn build_request_body(config: &AnthropicConfig, notes: &str, topic: &str) -> Value {
    json!({
        "model": config.model,
        "max_tokens": config.max_tokens,
        "messages": [{
            "role": "user",
            "content": build_prompt(notes, topic),
        }],
        "tools": [{
            "name": TOOL_NAME,
            "description": "Record the generated flashcard deck.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "topic": {
                        "type": "string",
                        "description": "Topic name for the flashcard deck"
                    },
                    "flashcards": {
                        "type": "array",
                        "description": "Question and answer pairs",
                        "maxItems": MAX_FLASHCARDS,
                        "items": {
                            "type": "object",
                            "properties": {
                                "question": {
                                    "type": "string",
                                    "description": "Question testing understanding"
                                },
                                "answer": {
                                    "type": "string",
                                    "description": "Answer with a short explanation"
                                }
                            },
                            "required": ["question", "answer"]
                        }
                    }
                },
                "required": ["topic", "flashcards"]
            }
        }],
        "tool_choice": { "type": "tool", "name": TOOL_NAME },
    })
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse { name: String, input: Value },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct FlashcardPayload {
    topic: String,
    flashcards: Vec<QAItem>,
}

/// Extract and validate the flashcard set from a Messages API response body.
pub fn parse_response(body: &str) -> Result<FlashcardSet, ProviderError> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Other(format!("unreadable response: {e}")))?;

    let input = response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::ToolUse { name, input } if name == TOOL_NAME => Some(input),
            _ => None,
        })
        .ok_or_else(|| ProviderError::Other("response contained no flashcards".to_string()))?;

    let payload: FlashcardPayload = serde_json::from_value(input)
        .map_err(|e| ProviderError::Other(format!("malformed flashcard payload: {e}")))?;

    FlashcardSet {
        topic: payload.topic,
        items: payload.flashcards,
    }
    .validated()
    .map_err(|e| ProviderError::Other(format!("invalid flashcard payload: {e}")))
}

/// Map HTTP error responses to typed errors.
pub fn map_http_error(
    status: reqwest::StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> ProviderError {
    let detail = extract_error_message(body);

    match status.as_u16() {
        429 => ProviderError::RateLimited { retry_after },
        503 | 529 => ProviderError::Overloaded(detail),
        401 | 403 => ProviderError::Unauthorized(detail),
        400 => ProviderError::BadRequest(detail),
        _ => ProviderError::Other(format!("HTTP {status}: {detail}")),
    }
}

/// Pull the human-readable message out of an Anthropic error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| {
            if body.is_empty() {
                "no response body".to_string()
            } else {
                body.chars().take(500).collect()
            }
        })
}

/// Parse a `retry-after` header given in seconds, capped at [`MAX_RETRY_AFTER`].
fn parse_retry_after(value: Option<&reqwest::header::HeaderValue>) -> Option<Duration> {
    let secs: f64 = value?.to_str().ok()?.trim().parse().ok()?;
    if secs.is_nan() || secs < 0.0 {
        return None;
    }
    let delay = Duration::try_from_secs_f64(secs).unwrap_or(MAX_RETRY_AFTER);
    Some(delay.min(MAX_RETRY_AFTER))
}

/// Anthropic-backed generator.
pub struct AnthropicGenerator {
    config: AnthropicConfig,
    client: reqwest::Client,
}

impl AnthropicGenerator {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl FlashcardGenerator for AnthropicGenerator {
    async fn generate(&self, notes: &str, topic: &str) -> Result<FlashcardSet, ProviderError> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = build_request_body(&self.config, notes, topic);

        tracing::debug!(model = %self.config.model, topic, "Requesting flashcards");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Anthropic request failed");
                ProviderError::Other(format!("connection error: {e}"))
            })?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Other(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::debug!(status = %status, body = %text, "Anthropic request returned error");
            return Err(map_http_error(status, retry_after, &text));
        }

        let set = parse_response(&text)?;
        tracing::info!(topic, count = set.items.len(), "Generated flashcards");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use reqwest::StatusCode;

    fn tool_response(input: Value) -> String {
        json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [
                { "type": "text", "text": "Here are your flashcards." },
                { "type": "tool_use", "id": "toolu_01", "name": TOOL_NAME, "input": input }
            ],
            "stop_reason": "tool_use"
        })
        .to_string()
    }

    #[test]
    fn request_forces_flashcard_tool() {
        let config = AnthropicConfig::new("key");
        let body = build_request_body(&config, "Borrowing rules", "Rust");

        assert_eq!(body["model"], AnthropicConfig::DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["tool_choice"]["name"], TOOL_NAME);
        assert_eq!(body["tools"][0]["input_schema"]["properties"]["flashcards"]["maxItems"], 10);

        let prompt = body["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.contains("Topic: Rust"));
        assert!(prompt.contains("Borrowing rules"));
    }

    #[test]
    fn parses_tool_use_block() {
        let body = tool_response(json!({
            "topic": "Rust",
            "flashcards": [
                { "question": "Why does Rust have lifetimes?", "answer": "To prove references stay valid." },
                { "question": "How is a move different from a copy?", "answer": "The source is invalidated." }
            ]
        }));

        let set = parse_response(&body).unwrap();
        assert_eq!(set.topic, "Rust");
        assert_eq!(set.items.len(), 2);
        assert_eq!(set.items[0].question, "Why does Rust have lifetimes?");
    }

    #[test]
    fn response_without_tool_use_is_an_error() {
        let body = json!({
            "content": [{ "type": "text", "text": "Sorry, I can't help." }]
        })
        .to_string();

        assert!(matches!(parse_response(&body), Err(ProviderError::Other(_))));
    }

    #[test]
    fn invalid_payload_is_an_error() {
        let body = tool_response(json!({ "topic": "Rust", "flashcards": [] }));
        let err = parse_response(&body).unwrap_err();
        assert!(err.to_string().contains("invalid flashcard payload"));
    }

    #[test]
    fn http_error_429_carries_retry_after() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(20)),
            r#"{"type":"error","error":{"type":"rate_limit_error","message":"Too many requests"}}"#,
        );
        assert_eq!(
            err,
            ProviderError::RateLimited {
                retry_after: Some(Duration::from_secs(20))
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn http_error_529_overloaded() {
        let status = StatusCode::from_u16(529).unwrap();
        let err = map_http_error(
            status,
            None,
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        assert_eq!(err, ProviderError::Overloaded("Overloaded".to_string()));
        assert!(err.is_retryable());
    }

    #[test]
    fn http_error_401() {
        let err = map_http_error(
            StatusCode::UNAUTHORIZED,
            None,
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        );
        assert_eq!(err, ProviderError::Unauthorized("invalid x-api-key".to_string()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn http_error_400() {
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            None,
            r#"{"type":"error","error":{"type":"invalid_request_error","message":"prompt is too long"}}"#,
        );
        assert_eq!(err, ProviderError::BadRequest("prompt is too long".to_string()));
    }

    #[test]
    fn http_error_500_is_other() {
        let err = map_http_error(StatusCode::INTERNAL_SERVER_ERROR, None, "");
        assert!(matches!(&err, ProviderError::Other(m) if m.contains("no response body")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn retry_after_header_parsing() {
        let value = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&value)), Some(Duration::from_secs(12)));

        let value = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&value)), None);
        assert_eq!(parse_retry_after(None), None);

        let value = HeaderValue::from_static("-3");
        assert_eq!(parse_retry_after(Some(&value)), None);
    }

    #[test]
    fn oversized_retry_after_is_capped() {
        for raw in ["86400", "1e20", "inf"] {
            let value = HeaderValue::from_str(raw).unwrap();
            assert_eq!(parse_retry_after(Some(&value)), Some(MAX_RETRY_AFTER), "{raw}");
        }
    }
}
