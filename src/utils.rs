//! Streaming utilities for SSE parsing and delta aggregation.
//!
//! The completions endpoint answers with Server-Sent Events:
//!
//! ```text
//! data: {"id":"chatcmpl-1","object":"chat.completion.chunk","choices":[...]}
//!
//! data: {"id":"chatcmpl-1","object":"chat.completion.chunk","choices":[...]}
//!
//! data: [DONE]
//! ```
//!
//! [`parse_sse_stream`] turns the raw byte stream into parsed [`OpenAIChunk`]s,
//! buffering across network chunk boundaries (an event may be split over any
//! number of reads). [`TextAggregator`] then folds the chunk deltas into the
//! complete reply while handing each fragment to the caller for live display.
//!
//! ```text
//! Raw HTTP Stream (SSE format)
//!     │
//!     │ parse_sse_stream()
//!     ▼
//! Stream<OpenAIChunk>
//!     │
//!     │ TextAggregator::process_chunk()
//!     ▼
//! text deltas ──► caller     full text ──► assistant Message
//! ```

use crate::types::OpenAIChunk;
use crate::{Error, Result};
use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;

/// Stream of parsed completion chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<OpenAIChunk>> + Send>>;

/// End-of-stream sentinel sent as the last `data:` payload
const DONE_SENTINEL: &str = "[DONE]";

/// Accumulates streamed text deltas into one reply.
///
/// Chunks are processed in arrival order. Each text delta is appended to the
/// buffer and also returned so the caller can print it immediately. The reply
/// is complete once a chunk carries a `finish_reason`; some servers close the
/// stream without one, in which case the buffer so far is the reply.
#[derive(Debug, Default)]
pub struct TextAggregator {
    text: String,
    finish_reason: Option<String>,
}

impl TextAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk in, returning the text it added (if any)
    pub fn process_chunk(&mut self, chunk: OpenAIChunk) -> Option<String> {
        let mut added = String::new();

        // n > 1 is never requested, so every choice belongs to the same reply
        for choice in chunk.choices {
            if let Some(content) = choice.delta.content {
                added.push_str(&content);
            }
            if let Some(reason) = choice.finish_reason {
                self.finish_reason = Some(reason);
            }
        }

        if added.is_empty() {
            return None;
        }
        self.text.push_str(&added);
        Some(added)
    }

    pub fn is_finished(&self) -> bool {
        self.finish_reason.is_some()
    }

    /// `stop`, `length`, `content_filter`, ... once finished
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Decode one SSE `data:` payload
///
/// Returns `None` for the `[DONE]` sentinel and for blank payloads.
pub fn parse_sse_payload(data: &str) -> Option<Result<OpenAIChunk>> {
    let data = data.trim();
    if data.is_empty() || data == DONE_SENTINEL {
        return None;
    }

    Some(
        serde_json::from_str::<OpenAIChunk>(data)
            .map_err(|e| Error::provider(format!("Failed to parse chunk: {}", e))),
    )
}

/// Parse a response byte stream as Server-Sent Events
///
/// Transport failures become `Network` errors; malformed payloads become
/// `Provider` errors. Comments, heartbeats and the `[DONE]` sentinel are
/// skipped.
pub fn parse_sse_stream<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let stream = bytes.eventsource().filter_map(|event| async move {
        match event {
            Ok(event) => parse_sse_payload(&event.data),
            Err(e) => Some(Err(Error::network(format!("Stream interrupted: {}", e)))),
        }
    });

    Box::pin(stream)
}
