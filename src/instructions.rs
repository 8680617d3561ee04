//! Tagged-instruction protocol between model replies and the executor
//!
//! The system prompt teaches the model four XML-like tags. A reply may contain
//! any number of them, interleaved with prose; they are extracted in order of
//! appearance:
//!
//! ```text
//! <create_file path="src/app.py">
//! print("hi")
//! </create_file>
//! <read_file path="README.md"/>
//! <list_files dir="src"/>
//! <run_code language="python">
//! print(1 + 1)
//! </run_code>
//! ```
//!
//! Block bodies lose exactly one leading and one trailing newline, so the
//! content written to disk is what sits between the tag lines.

use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

static INSTRUCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)<create_file\s+path\s*=\s*"(?P<create_path>[^"]*)"\s*>(?P<content>.*?)</create_file>"#,
        r#"|<read_file\s+path\s*=\s*"(?P<read_path>[^"]*)"\s*/?>(?:\s*</read_file>)?"#,
        r#"|<list_files(?:\s+dir\s*=\s*"(?P<dir>[^"]*)")?\s*/?>(?:\s*</list_files>)?"#,
        r#"|<run_code(?:\s+language\s*=\s*"(?P<language>[^"]*)")?\s*>(?P<code>.*?)</run_code>"#,
    ))
    .expect("instruction pattern is valid")
});

/// One side effect requested by the assistant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    CreateFile { path: String, content: String },
    ReadFile { path: String },
    ListFiles { dir: String },
    RunCode { language: String, code: String },
    /// A recognized tag that cannot be acted on (e.g. an empty path)
    None,
}

impl Instruction {
    pub fn is_none(&self) -> bool {
        matches!(self, Instruction::None)
    }

    /// Short tag name used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Instruction::CreateFile { .. } => "create_file",
            Instruction::ReadFile { .. } => "read_file",
            Instruction::ListFiles { .. } => "list_files",
            Instruction::RunCode { .. } => "run_code",
            Instruction::None => "none",
        }
    }

    fn from_captures(caps: &Captures<'_>) -> Self {
        if let Some(path) = caps.name("create_path") {
            let content = caps.name("content").map_or("", |m| m.as_str());
            return non_empty(path.as_str()).map_or(Instruction::None, |path| {
                Instruction::CreateFile {
                    path,
                    content: strip_block_newlines(content).to_string(),
                }
            });
        }

        if let Some(path) = caps.name("read_path") {
            return non_empty(path.as_str())
                .map_or(Instruction::None, |path| Instruction::ReadFile { path });
        }

        if let Some(code) = caps.name("code") {
            let code = strip_block_newlines(code.as_str());
            if code.trim().is_empty() {
                return Instruction::None;
            }
            let language = caps
                .name("language")
                .and_then(|m| non_empty(m.as_str()))
                .unwrap_or_else(|| "python".to_string());
            return Instruction::RunCode {
                language: language.to_lowercase(),
                code: code.to_string(),
            };
        }

        // Only list_files is left; a missing dir means the working directory
        let dir = caps
            .name("dir")
            .and_then(|m| non_empty(m.as_str()))
            .unwrap_or_else(|| ".".to_string());
        Instruction::ListFiles { dir }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::CreateFile { path, content } => {
                write!(f, "create_file {} ({} bytes)", path, content.len())
            }
            Instruction::ReadFile { path } => write!(f, "read_file {}", path),
            Instruction::ListFiles { dir } => write!(f, "list_files {}", dir),
            Instruction::RunCode { language, code } => {
                write!(f, "run_code {} ({} lines)", language, code.lines().count())
            }
            Instruction::None => write!(f, "none"),
        }
    }
}

/// Extract every actionable instruction from `reply`, in order of appearance
///
/// Malformed tags are logged and skipped.
pub fn parse_instructions(reply: &str) -> Vec<Instruction> {
    INSTRUCTION_RE
        .captures_iter(reply)
        .map(|caps| Instruction::from_captures(&caps))
        .filter(|instruction| {
            if instruction.is_none() {
                log::warn!("Skipping malformed instruction tag in model reply");
            }
            !instruction.is_none()
        })
        .collect()
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn strip_block_newlines(body: &str) -> &str {
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    body.strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body)
}
