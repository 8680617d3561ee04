//! One interactive chat session
//!
//! A [`Session`] owns everything a conversation needs: the transcript, the
//! gateway, the side-effect executor and the instruction results still waiting
//! to be shown to the model. Each call to [`Session::chat`] is one turn:
//!
//! ```text
//! user text ─> (pending results + text) appended as user message
//!     │
//!     ├─> gateway.complete(system prompt, context)   ──> TurnEvent::Delta
//!     │
//!     ├─> reply appended as assistant message
//!     │
//!     └─> executor.apply(reply) ──> TurnEvent::Instruction
//!                                   └─> pending results for the next turn
//! ```
//!
//! A turn is all-or-nothing with respect to the transcript. If the gateway
//! fails, the user message is removed again and the pending results are kept
//! for the next attempt.

use crate::context::{TokenUsage, estimate_text_tokens, is_approaching_limit};
use crate::executor::{Executor, InstructionReport, render_results};
use crate::gateway::ModelGateway;
use crate::prompts::COMPLETION_MARKER;
use crate::transcript::Transcript;
use crate::types::{Message, SessionOptions};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Share of the context window at which [`Session::near_context_limit`] trips
const CONTEXT_WARNING_MARGIN: f32 = 0.9;

/// Progress reported while a turn runs
#[derive(Debug)]
pub enum TurnEvent<'a> {
    /// A fragment of the assistant reply, in arrival order
    Delta(&'a str),
    /// One instruction from the reply has been applied
    Instruction(&'a InstructionReport),
}

/// Callback receiving [`TurnEvent`]s
pub type TurnSink<'a> = &'a mut (dyn FnMut(TurnEvent<'_>) + Send);

/// Result of a successful turn
#[derive(Debug)]
pub struct TurnOutcome {
    pub reply: Message,
    pub reports: Vec<InstructionReport>,
    /// The reply contains the automode completion marker
    pub completed: bool,
}

pub struct Session {
    gateway: Arc<dyn ModelGateway>,
    transcript: Transcript,
    executor: Executor,
    options: SessionOptions,
    pending_results: Option<String>,
    usage: TokenUsage,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("messages", &self.transcript.len())
            .field("executor", &self.executor)
            .field("pending_results", &self.pending_results.is_some())
            .field("usage", &self.usage)
            .finish()
    }
}

impl Session {
    /// Session that runs code through a local process sandbox
    pub fn new(gateway: Arc<dyn ModelGateway>, options: SessionOptions) -> Self {
        let executor = Executor::with_process_sandbox(&options.work_dir, options.code_timeout);
        Self::with_executor(gateway, executor, options)
    }

    pub fn with_executor(
        gateway: Arc<dyn ModelGateway>,
        executor: Executor,
        options: SessionOptions,
    ) -> Self {
        let usage = TokenUsage::new(options.context_window);
        Self {
            gateway,
            transcript: Transcript::new(),
            executor,
            options,
            pending_results: None,
            usage,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Approximate tokens exchanged since the last reset
    pub fn usage(&self) -> &TokenUsage {
        &self.usage
    }

    /// Instruction results that will lead the next user message
    pub fn pending_results(&self) -> Option<&str> {
        self.pending_results.as_deref()
    }

    /// Whether the next request is estimated to nearly fill the context window
    ///
    /// Counts the system prompt and the bounded context that would be sent.
    pub fn near_context_limit(&self) -> bool {
        let context = self.transcript.to_context(self.options.max_context_messages);
        let window = self
            .options
            .context_window
            .saturating_sub(estimate_text_tokens(&self.options.system_prompt));
        is_approaching_limit(&context, window, CONTEXT_WARNING_MARGIN)
    }

    /// Send an ordinary user message
    pub async fn chat(&mut self, text: &str, on_event: TurnSink<'_>) -> Result<TurnOutcome> {
        self.chat_with_addendum(text, None, on_event).await
    }

    /// Send a message with an image path attached as a plain reference
    ///
    /// The image itself is never read or uploaded.
    ///
    /// # Errors
    ///
    /// `NotFound` if `image` does not name an existing file; the transcript is
    /// left untouched.
    pub async fn chat_with_image(
        &mut self,
        image: &Path,
        text: &str,
        on_event: TurnSink<'_>,
    ) -> Result<TurnOutcome> {
        let is_file = tokio::fs::metadata(image)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(Error::not_found(format!(
                "image file {} does not exist",
                image.display()
            )));
        }

        let text = format!("[Image attached: {}]\n{}", image.display(), text);
        self.chat(&text, on_event).await
    }

    /// Send a message with extra text appended to the system prompt for this
    /// request only
    pub async fn chat_with_addendum(
        &mut self,
        text: &str,
        addendum: Option<&str>,
        on_event: TurnSink<'_>,
    ) -> Result<TurnOutcome> {
        let mark = self.transcript.len();

        let content = match &self.pending_results {
            Some(results) => format!("{}\n\n{}", results, text),
            None => text.to_string(),
        };
        self.transcript.append(Message::user(content));

        let system_prompt = match addendum {
            Some(extra) => format!("{}{}", self.options.system_prompt, extra),
            None => self.options.system_prompt.clone(),
        };

        let result = {
            let context = self.transcript.to_context(self.options.max_context_messages);
            let mut forward = |delta: &str| on_event(TurnEvent::Delta(delta));
            let result = self
                .gateway
                .complete(&system_prompt, &context, &mut forward)
                .await;
            if let Ok(reply) = &result {
                self.usage.record(&context, &system_prompt, &reply.content);
            }
            result
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                log::debug!("Turn failed, discarding it: {}", e);
                self.transcript.rollback(mark);
                return Err(e);
            }
        };

        self.pending_results = None;
        self.transcript.append(reply.clone());

        let reports = self.executor.apply(&reply.content).await;
        for report in &reports {
            on_event(TurnEvent::Instruction(report));
        }
        if !reports.is_empty() {
            self.pending_results = Some(render_results(&reports));
        }

        let completed = reply.content.contains(COMPLETION_MARKER);
        Ok(TurnOutcome {
            reply,
            reports,
            completed,
        })
    }

    /// Forget the conversation: transcript, pending results and usage
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.pending_results = None;
        self.usage.reset();
        log::debug!("Session reset");
    }

    /// Export the transcript into the working directory
    pub fn save_chat(&self) -> Result<PathBuf> {
        self.transcript.save(&self.options.work_dir)
    }
}
