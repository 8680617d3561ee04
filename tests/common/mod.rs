//! Shared stub gateway for integration tests
//!
//! Replies are scripted up front. Every call records the system prompt and the
//! context it received so tests can check exactly what the model was shown.

#![allow(dead_code)]

use async_trait::async_trait;
use groq_engineer::{DeltaSink, Error, Message, ModelGateway, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: String,
    calls: AtomicUsize,
    system_prompts: Mutex<Vec<String>>,
    contexts: Mutex<Vec<Vec<Message>>>,
    interrupt_on: Option<(usize, Arc<AtomicBool>)>,
}

impl ScriptedGateway {
    /// Replies in order; once the script runs out every call answers `fallback`
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: "Working on it.".to_string(),
            calls: AtomicUsize::new(0),
            system_prompts: Mutex::new(Vec::new()),
            contexts: Mutex::new(Vec::new()),
            interrupt_on: None,
        }
    }

    /// Always answer `reply`
    pub fn repeating(reply: &str) -> Self {
        let mut gateway = Self::new(Vec::new());
        gateway.fallback = reply.to_string();
        gateway
    }

    /// Set `flag` while serving call number `call` (1-based)
    pub fn interrupt_on_call(mut self, call: usize, flag: Arc<AtomicBool>) -> Self {
        self.interrupt_on = Some((call, flag));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.system_prompts.lock().unwrap().clone()
    }

    pub fn contexts(&self) -> Vec<Vec<Message>> {
        self.contexts.lock().unwrap().clone()
    }

    /// Content of the newest message in the context of call `index` (0-based)
    pub fn last_user_content(&self, index: usize) -> String {
        self.contexts.lock().unwrap()[index]
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        context: &[Message],
        on_delta: DeltaSink<'_>,
    ) -> Result<Message> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.system_prompts
            .lock()
            .unwrap()
            .push(system_prompt.to_string());
        self.contexts.lock().unwrap().push(context.to_vec());

        if let Some((at, flag)) = &self.interrupt_on {
            if *at == call {
                flag.store(true, Ordering::SeqCst);
            }
        }

        let next = self.replies.lock().unwrap().pop_front();
        let reply = match next {
            Some(reply) => reply?,
            None => self.fallback.clone(),
        };

        // Stream in two pieces like a real provider would
        let split = reply.len() / 2;
        if reply.is_char_boundary(split) && split > 0 {
            on_delta(&reply[..split]);
            on_delta(&reply[split..]);
        } else {
            on_delta(&reply);
        }

        Ok(Message::assistant(reply))
    }
}

pub fn rate_limited() -> Result<String> {
    Err(Error::rate_limit("Too many requests"))
}
