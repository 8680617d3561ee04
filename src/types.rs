//! Core types for groq-engineer

use crate::retry::RetryConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Options for the model gateway connection
#[derive(Clone)]
pub struct GatewayOptions {
    /// Model name (e.g., "llama3-8b-8192")
    pub model: String,

    /// OpenAI-compatible endpoint URL
    pub base_url: String,

    /// API key sent as a bearer token
    pub api_key: String,

    /// Maximum tokens to generate (None uses provider default)
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 to 2.0)
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Backoff policy for establishing a request
    pub retry: RetryConfig,
}

impl std::fmt::Debug for GatewayOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayOptions")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl GatewayOptions {
    /// Create a new builder for GatewayOptions
    pub fn builder() -> GatewayOptionsBuilder {
        GatewayOptionsBuilder::default()
    }
}

/// Builder for GatewayOptions
#[derive(Default)]
pub struct GatewayOptionsBuilder {
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout: Option<u64>,
    retry: Option<RetryConfig>,
}

impl std::fmt::Debug for GatewayOptionsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayOptionsBuilder")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl GatewayOptionsBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn build(self) -> crate::Result<GatewayOptions> {
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| crate::Error::config("model is required"))?;

        let base_url = self
            .base_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| crate::Error::config("base_url is required"))?;

        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| crate::Error::config("api_key is required"))?;

        let temperature = self.temperature.unwrap_or(0.7);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(crate::Error::config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                temperature
            )));
        }

        Ok(GatewayOptions {
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_tokens: self.max_tokens.or(Some(4096)),
            temperature,
            timeout: self.timeout.unwrap_or(120),
            retry: self.retry.unwrap_or_default(),
        })
    }
}

/// Settings owned by a chat session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Base system instruction, prepended to every request
    pub system_prompt: String,

    /// Only the most recent N transcript messages are sent (None sends all)
    pub max_context_messages: Option<usize>,

    /// Directory that file instructions and chat exports are relative to
    pub work_dir: PathBuf,

    /// Upper bound for one sandboxed code run
    pub code_timeout: Duration,

    /// Model context size in tokens, used for the approximate usage display
    pub context_window: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            system_prompt: crate::prompts::BASE_SYSTEM_PROMPT.to_string(),
            max_context_messages: None,
            work_dir: PathBuf::from("."),
            code_timeout: Duration::from_secs(10),
            context_window: 8192,
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A limit of 0 is treated as 1; the newest message is always sent
    pub fn with_max_context_messages(mut self, max: usize) -> Self {
        self.max_context_messages = Some(max);
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_code_timeout(mut self, timeout: Duration) -> Self {
        self.code_timeout = timeout;
        self
    }

    pub fn with_context_window(mut self, tokens: usize) -> Self {
        self.context_window = tokens;
        self
    }
}

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message in the conversation
///
/// Never sent as is; [`OpenAIMessage`] is the wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }
}

/// OpenAI API message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for OpenAIMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

/// OpenAI API request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// OpenAI API streaming chunk
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<OpenAIChoice>,
}

/// OpenAI choice in streaming response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    #[serde(default)]
    pub index: u32,
    pub delta: OpenAIDelta,
    pub finish_reason: Option<String>,
}

/// OpenAI delta in streaming response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAIDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Error envelope returned with non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIErrorBody {
    pub error: OpenAIErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIErrorDetail {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_options_builder() {
        let options = GatewayOptions::builder()
            .model("test-model")
            .base_url("http://localhost:1234/v1/")
            .api_key("test-key")
            .max_tokens(1000)
            .temperature(0.5)
            .timeout(30)
            .build()
            .unwrap();

        assert_eq!(options.model, "test-model");
        assert_eq!(options.base_url, "http://localhost:1234/v1");
        assert_eq!(options.api_key, "test-key");
        assert_eq!(options.max_tokens, Some(1000));
        assert_eq!(options.temperature, 0.5);
        assert_eq!(options.timeout, 30);
    }

    #[test]
    fn test_gateway_options_builder_defaults() {
        let options = GatewayOptions::builder()
            .model("test-model")
            .base_url("http://localhost:1234/v1")
            .api_key("k")
            .build()
            .unwrap();

        assert_eq!(options.max_tokens, Some(4096));
        assert_eq!(options.temperature, 0.7);
        assert_eq!(options.timeout, 120);
        assert_eq!(options.retry.max_attempts, 3);
    }

    #[test]
    fn test_gateway_options_builder_missing_required() {
        let result = GatewayOptions::builder()
            .base_url("http://localhost:1234/v1")
            .api_key("k")
            .build();
        assert!(result.is_err());

        let result = GatewayOptions::builder().model("m").api_key("k").build();
        assert!(result.is_err());

        // Blank credential counts as missing
        let result = GatewayOptions::builder()
            .model("m")
            .base_url("http://localhost:1234/v1")
            .api_key("   ")
            .build();
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_gateway_options_rejects_temperature_out_of_range() {
        let result = GatewayOptions::builder()
            .model("m")
            .base_url("http://localhost:1234/v1")
            .api_key("k")
            .temperature(3.5)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let options = GatewayOptions::builder()
            .model("m")
            .base_url("http://localhost:1234/v1")
            .api_key("gsk_secret")
            .build()
            .unwrap();
        let printed = format!("{:?}", options);
        assert!(!printed.contains("gsk_secret"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn test_session_options_defaults() {
        let options = SessionOptions::default();
        assert!(options.system_prompt.contains("<create_file"));
        assert_eq!(options.max_context_messages, None);
        assert_eq!(options.code_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "Hello");

        assert_eq!(Message::assistant("Hi").role, MessageRole::Assistant);
        assert_eq!(Message::system("Be brief").role, MessageRole::System);
    }

    #[test]
    fn test_message_keeps_role_on_the_wire() {
        let wire = OpenAIMessage::from(&Message::assistant("Hi"));
        assert_eq!(wire.role, "assistant");
        assert_eq!(wire.content, "Hi");
        assert_eq!(MessageRole::User.as_str(), "user");
        assert_eq!(MessageRole::System.as_str(), "system");
    }

    #[test]
    fn test_session_options_context_window() {
        let options = SessionOptions::new().with_context_window(32768);
        assert_eq!(options.context_window, 32768);
        assert_eq!(SessionOptions::default().context_window, 8192);
    }

    #[test]
    fn test_openai_request_serialization() {
        let request = OpenAIRequest {
            model: "llama3-8b-8192".to_string(),
            messages: vec![OpenAIMessage::from(&Message::user("Hello"))],
            stream: true,
            max_tokens: Some(100),
            temperature: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("llama3-8b-8192"));
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"stream\":true"));
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_openai_chunk_deserialization() {
        let json = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1234567890,
            "model": "llama3-8b-8192",
            "choices": [{
                "index": 0,
                "delta": {"content": "Hello"},
                "finish_reason": null
            }],
            "x_groq": {"id": "req_1"}
        }"#;

        let chunk: OpenAIChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.id, "chatcmpl-1");
        assert_eq!(chunk.choices.len(), 1);
        assert_eq!(chunk.choices[0].delta.content, Some("Hello".to_string()));
    }

    #[test]
    fn test_error_body_deserialization() {
        let json = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        let body: OpenAIErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error.message, "Invalid API Key");
    }
}
