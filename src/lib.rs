//! # groq-engineer
//!
//! A terminal chat client for Groq-hosted models (or any OpenAI-compatible
//! endpoint) with streamed replies, assistant-driven file and code
//! instructions, Markdown chat export, and a bounded "automode" loop.
//!
//! ## Overview
//!
//! Every line the user types is classified into a [`Directive`]. Ordinary
//! messages go through a [`Session`], which appends them to the [`Transcript`],
//! asks the [`ModelGateway`] for a reply, and hands the reply to the
//! [`Executor`]. The executor applies any tagged instructions the model
//! emitted (create, read, or list files; run a snippet in the sandbox) and the
//! results are folded into the next message the model sees.
//!
//! ```rust,no_run
//! use groq_engineer::{GatewayOptions, GroqGateway, Session, SessionOptions, TurnEvent};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = GroqGateway::new(
//!         GatewayOptions::builder()
//!             .model("llama3-8b-8192")
//!             .base_url("https://api.groq.com/openai/v1")
//!             .api_key(std::env::var("GROQ_API_KEY")?)
//!             .build()?,
//!     )?;
//!
//!     let mut session = Session::new(Arc::new(gateway), SessionOptions::new());
//!     session
//!         .chat("Create hello.py that prints hello", &mut |event| {
//!             if let TurnEvent::Delta(text) = event {
//!                 print!("{}", text);
//!             }
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **directive**: classification of one input line
//! - **transcript**: ordered message history, reset and Markdown export
//! - **gateway** / **client**: the model boundary and its streaming HTTP implementation
//! - **instructions**: the tagged-instruction protocol parsed out of replies
//! - **executor** / **sandbox**: side effects in the working directory and code runs
//! - **session**: one transactional chat turn at a time
//! - **automode**: the bounded autonomous loop with its interrupt flag
//! - **context**: approximate token estimation and history truncation
//! - **retry**: exponential backoff with jitter for establishing requests
//! - **ui**: terminal formatting used by the binary

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

/// Streaming HTTP gateway for OpenAI-compatible chat completions.
mod client;

/// Environment lookups for the API key, endpoint and model.
mod config;

/// Approximate token estimation and history truncation.
mod context;

/// Line classification for the interactive loop.
mod directive;

/// Error types used across the crate.
mod error;

/// Side effects requested by the assistant.
mod executor;

/// The model boundary trait.
mod gateway;

/// Tagged-instruction parsing.
mod instructions;

/// Prompt text: system prompt, automode addendum and continuation prompt.
mod prompts;

/// Ordered message history.
mod transcript;

/// Messages, options and wire types.
mod types;

/// SSE parsing and delta aggregation.
mod utils;

// ============================================================================
// PUBLIC EXPORTS
// ============================================================================

/// Bounded autonomous loop and its state machine.
pub mod automode;

/// Retry utilities with exponential backoff and jitter.
pub mod retry;

/// Isolated execution of code snippets.
pub mod sandbox;

/// Chat session owning the transcript, gateway and executor.
pub mod session;

/// Terminal formatting helpers.
pub mod ui;

// --- Gateway ---

pub use client::{GroqGateway, classify_status};
pub use gateway::{DeltaSink, ModelGateway};

// --- Configuration ---

pub use config::{
    API_KEY_VAR, BASE_URL_VAR, DEFAULT_BASE_URL, DEFAULT_MODEL, MODEL_VAR, get_api_key,
    get_base_url, get_model,
};

// --- Context Management ---

pub use context::{
    TokenUsage, estimate_text_tokens, estimate_tokens, is_approaching_limit, truncate_messages,
};

// --- Commands ---

pub use directive::{Directive, parse_directive};

// --- Error Handling ---

pub use error::{Error, Result};

// --- Instructions and Side Effects ---

pub use executor::{Executor, InstructionReport, render_results};
pub use instructions::{Instruction, parse_instructions};

// --- Prompts ---

pub use prompts::{BASE_SYSTEM_PROMPT, COMPLETION_MARKER, CONTINUATION_PROMPT, automode_addendum};

// --- Session ---

pub use automode::{AutomodeController, AutomodeEvent, AutomodeSummary, StopReason};
pub use session::{Session, TurnEvent, TurnOutcome};
pub use transcript::{EXPORT_TITLE, Transcript};

// --- Core Types ---

pub use types::{GatewayOptions, GatewayOptionsBuilder, Message, MessageRole, SessionOptions};

// --- Streaming ---

pub use utils::{TextAggregator, parse_sse_payload, parse_sse_stream};

// ============================================================================
// CONVENIENCE PRELUDE
// ============================================================================

/// Convenience module containing the most commonly used types and functions.
/// Import with `use groq_engineer::prelude::*;`.
pub mod prelude {
    pub use crate::{
        AutomodeController, Directive, Error, GatewayOptions, GroqGateway, Message,
        MessageRole, ModelGateway, Result, Session, SessionOptions, StopReason, Transcript,
        TurnEvent, parse_directive,
    };
}
