//! HTTP model gateway for Groq's OpenAI-compatible API
//!
//! [`GroqGateway`] sends the system prompt and the transcript context to
//! `{base_url}/chat/completions` with `stream: true` and folds the Server-Sent
//! Events reply into one assistant [`Message`].
//!
//! ## Request Flow
//!
//! ```text
//! system prompt + context
//!     │
//!     ├─> OpenAIRequest (system message first, then context in order)
//!     │
//!     ├─> POST /chat/completions      (retried on transient failures)
//!     │
//!     ├─> status check                (401/403, 429, other non-success)
//!     │
//!     ├─> SSE chunks ─> TextAggregator ─> on_delta(fragment)
//!     │
//!     └─> Message::assistant(full text)
//! ```
//!
//! Only establishing the request is retried. Once the first byte of the body
//! has been handed to the caller a failure ends the call, since the caller has
//! already printed part of the reply.

use crate::gateway::{DeltaSink, ModelGateway};
use crate::retry::retry_transient;
use crate::types::{GatewayOptions, Message, OpenAIErrorBody, OpenAIMessage, OpenAIRequest};
use crate::utils::{TextAggregator, parse_sse_stream};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::StatusCode;
use std::time::Duration;

/// Streaming client for the completions endpoint
///
/// Holds one `reqwest::Client` for the lifetime of the session so connections
/// are pooled across turns.
pub struct GroqGateway {
    options: GatewayOptions,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GroqGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqGateway")
            .field("options", &self.options)
            .finish()
    }
}

impl GroqGateway {
    /// Creates a gateway with an HTTP client using the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built (for example
    /// when no TLS backend is available).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use groq_engineer::{GatewayOptions, GroqGateway};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let gateway = GroqGateway::new(
    ///     GatewayOptions::builder()
    ///         .model("llama3-8b-8192")
    ///         .base_url("https://api.groq.com/openai/v1")
    ///         .api_key("gsk_test")
    ///         .build()?,
    /// )?;
    /// assert_eq!(gateway.options().model, "llama3-8b-8192");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(options: GatewayOptions) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            options,
            http_client,
        })
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Build the request payload; the system prompt is never part of `context`
    pub fn build_request(&self, system_prompt: &str, context: &[Message]) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(context.len() + 1);

        if !system_prompt.is_empty() {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            });
        }
        messages.extend(context.iter().map(OpenAIMessage::from));

        OpenAIRequest {
            model: self.options.model.clone(),
            messages,
            stream: true,
            max_tokens: self.options.max_tokens,
            temperature: Some(self.options.temperature),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.options.base_url)
    }

    /// POST the request and return the response once its status is known good
    async fn open_stream(&self, request: &OpenAIRequest) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.options.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|e| {
            log::warn!("Failed to read error response body: {}", e);
            String::new()
        });
        Err(classify_status(status, &body))
    }
}

/// Map a non-success HTTP status and its body to an error kind
///
/// The provider's `{"error": {"message": ...}}` body is unwrapped when present;
/// otherwise the raw body is used.
pub fn classify_status(status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<OpenAIErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.to_string()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::authentication(detail),
        StatusCode::TOO_MANY_REQUESTS => Error::rate_limit(detail),
        _ => Error::provider_status(status.as_u16(), format!("{}: {}", status, detail)),
    }
}

#[async_trait]
impl ModelGateway for GroqGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        context: &[Message],
        on_delta: DeltaSink<'_>,
    ) -> Result<Message> {
        let request = self.build_request(system_prompt, context);
        log::debug!(
            "Requesting completion from {} with {} messages",
            self.options.model,
            request.messages.len()
        );

        let response =
            retry_transient(self.options.retry.clone(), || self.open_stream(&request)).await?;

        let mut chunks = parse_sse_stream(response.bytes_stream());
        let mut aggregator = TextAggregator::new();

        while let Some(chunk) = chunks.next().await {
            if let Some(delta) = aggregator.process_chunk(chunk?) {
                on_delta(&delta);
            }
            if aggregator.is_finished() {
                break;
            }
        }

        if let Some(reason) = aggregator.finish_reason() {
            log::debug!("Completion finished: {}", reason);
        }

        let text = aggregator.into_text();
        if text.trim().is_empty() {
            return Err(Error::provider("Model returned an empty reply"));
        }

        Ok(Message::assistant(text))
    }
}
