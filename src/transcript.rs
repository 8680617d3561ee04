//! Ordered message history for one chat session
//!
//! The transcript is append-only from the outside: messages go in through
//! [`Transcript::append`] and come out as shared slices, so an appended message
//! is never edited. The only ways to shrink it are [`Transcript::clear`] (the
//! `reset` directive) and [`Transcript::rollback`], which the session uses to
//! discard a turn whose model call failed.

use crate::context::truncate_messages;
use crate::types::{Message, MessageRole};
use crate::{Error, Result};
use chrono::Local;
use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Heading written at the top of every export
pub const EXPORT_TITLE: &str = "# Groq Engineer Chat Log";

/// Saves within one second get `_1`, `_2`, ... up to this many
const MAX_SAVES_PER_SECOND: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Ordered context for the next model call
    ///
    /// With `max_messages` set, only the most recent messages are returned. The
    /// newest message is always included, so a limit of 0 acts like 1.
    pub fn to_context(&self, max_messages: Option<usize>) -> Cow<'_, [Message]> {
        match max_messages.map(|max| max.max(1)) {
            Some(max) if self.messages.len() > max => {
                Cow::Owned(truncate_messages(&self.messages, max))
            }
            _ => Cow::Borrowed(&self.messages),
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Drop every message appended after the transcript had `len` messages
    pub fn rollback(&mut self, len: usize) {
        if len < self.messages.len() {
            log::debug!(
                "Rolling transcript back from {} to {} messages",
                self.messages.len(),
                len
            );
            self.messages.truncate(len);
        }
    }

    /// Render the transcript as Markdown, one `##` section per message
    pub fn export(&self) -> String {
        let mut out = String::with_capacity(
            EXPORT_TITLE.len() + self.messages.iter().map(|m| m.content.len() + 16).sum::<usize>(),
        );
        out.push_str(EXPORT_TITLE);
        out.push_str("\n\n");

        for message in &self.messages {
            out.push_str("## ");
            out.push_str(section_title(message.role));
            out.push_str("\n\n");
            out.push_str(message.content.trim_end());
            out.push_str("\n\n");
        }

        out
    }

    /// Write [`Transcript::export`] to a timestamped file in `dir`
    ///
    /// An existing export is never overwritten; a second save in the same
    /// second gets a numeric suffix. Returns the path of the written file.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let stem = format!("Chat_{}", Local::now().format("%Y%m%d_%H%M%S"));
        let export = self.export();

        for n in 0..MAX_SAVES_PER_SECOND {
            let path = match n {
                0 => dir.join(format!("{}.md", stem)),
                n => dir.join(format!("{}_{}.md", stem, n)),
            };

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Error::file_system(format!("{}: {}", path.display(), e))),
            };
            file.write_all(export.as_bytes())
                .map_err(|e| Error::file_system(format!("{}: {}", path.display(), e)))?;

            log::debug!("Saved {} messages to {}", self.messages.len(), path.display());
            return Ok(path);
        }

        Err(Error::file_system(format!(
            "{}: too many exports in one second",
            dir.join(stem).display()
        )))
    }
}

fn section_title(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "User",
        MessageRole::Assistant => "AI",
        MessageRole::System => "System",
    }
}
