//! Context window helpers
//!
//! Everything here is approximate. Token counts use a character-based estimate
//! (1 token ≈ 4 characters) and are only meant to give the user a rough idea of
//! how full the context window is. The provider's tokenizer is never consulted.
//!
//! # Examples
//!
//! ```rust
//! use groq_engineer::{estimate_tokens, truncate_messages, Message};
//!
//! let messages = vec![Message::user("Hello"), Message::assistant("Hi there")];
//! let tokens = estimate_tokens(&messages);
//! assert!(tokens > 0);
//!
//! let recent = truncate_messages(&messages, 1);
//! assert_eq!(recent.len(), 1);
//! ```

use crate::types::Message;

/// Estimate token count for a message list
///
/// Uses character-based approximation (1 token ≈ 4 characters) plus a small
/// per-message overhead for role formatting.
pub fn estimate_tokens(messages: &[Message]) -> usize {
    if messages.is_empty() {
        return 0;
    }

    let mut total_chars = 0;

    for message in messages {
        // ~2 tokens for role formatting
        total_chars += 8;
        total_chars += message.content.len();
    }

    // Conversation-level overhead
    total_chars += 16;

    total_chars.div_ceil(4)
}

/// Estimate tokens for a bare string
pub fn estimate_text_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Keep the most recent `keep` messages
///
/// Returns a new Vec; the input is unchanged.
pub fn truncate_messages(messages: &[Message], keep: usize) -> Vec<Message> {
    let start = messages.len().saturating_sub(keep);
    messages[start..].to_vec()
}

/// Check if history is approaching a token limit
///
/// `true` if estimated tokens exceed `limit * margin`.
pub fn is_approaching_limit(messages: &[Message], limit: usize, margin: f32) -> bool {
    let estimated = estimate_tokens(messages);
    let threshold = (limit as f32 * margin) as usize;
    estimated > threshold
}

/// Running, approximate token tally for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: usize,
    pub output: usize,
    pub context_window: usize,
}

impl TokenUsage {
    pub fn new(context_window: usize) -> Self {
        Self {
            input: 0,
            output: 0,
            context_window,
        }
    }

    /// Add one round-trip: the context sent and the reply received
    pub fn record(&mut self, sent: &[Message], system_prompt: &str, reply: &str) {
        self.input += estimate_tokens(sent) + estimate_text_tokens(system_prompt);
        self.output += estimate_text_tokens(reply);
    }

    pub fn total(&self) -> usize {
        self.input + self.output
    }

    /// Share of the context window used, in percent (may exceed 100)
    pub fn percentage(&self) -> f64 {
        if self.context_window == 0 {
            return 0.0;
        }
        self.total() as f64 / self.context_window as f64 * 100.0
    }

    pub fn reset(&mut self) {
        self.input = 0;
        self.output = 0;
    }
}
