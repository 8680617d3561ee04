//! Boundary to the hosted completion service
//!
//! The session only knows this trait. [`crate::GroqGateway`] is the HTTP
//! implementation; tests substitute scripted stubs.

use crate::Result;
use crate::types::Message;
use async_trait::async_trait;

/// Receives text fragments as they stream in
pub type DeltaSink<'a> = &'a mut (dyn FnMut(&str) + Send);

#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Submit `system_prompt` followed by `context` and return the reply
    ///
    /// Text is forwarded to `on_delta` while it arrives; the returned message
    /// holds the complete reply with role `assistant`.
    ///
    /// # Errors
    ///
    /// One of `Authentication`, `RateLimit`, `Network` or `Provider`. Any text
    /// already passed to `on_delta` belongs to the failed call and must not be
    /// kept by the caller.
    async fn complete(
        &self,
        system_prompt: &str,
        context: &[Message],
        on_delta: DeltaSink<'_>,
    ) -> Result<Message>;
}
