//! Side-effect executor for assistant-requested instructions
//!
//! Every path is resolved against the executor's working directory. Absolute
//! paths and `..` components that climb above it are refused before any I/O
//! happens. Failures never escape [`Executor::apply`]: each instruction turns
//! into an [`InstructionReport`] that is shown to the user and folded into the
//! next request to the model.

use crate::instructions::{Instruction, parse_instructions};
use crate::sandbox::{ExecutionRequest, ProcessSandbox, Sandbox};
use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one instruction
#[derive(Debug)]
pub struct InstructionReport {
    pub instruction: Instruction,
    pub outcome: Result<String>,
}

impl InstructionReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// One entry of the `<instruction_results>` block
    pub fn render(&self) -> String {
        match &self.outcome {
            Ok(text) => format!("[{}] ok\n{}", self.instruction, text),
            Err(e) => format!("[{}] failed\n{}", self.instruction, e),
        }
    }
}

/// Wrap reports in the block the system prompt tells the model to expect
pub fn render_results(reports: &[InstructionReport]) -> String {
    let body = reports
        .iter()
        .map(InstructionReport::render)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("<instruction_results>\n{}\n</instruction_results>", body)
}

pub struct Executor {
    root: PathBuf,
    sandbox: Arc<dyn Sandbox>,
    code_timeout: Duration,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("root", &self.root)
            .field("code_timeout", &self.code_timeout)
            .finish()
    }
}

impl Executor {
    pub fn new(root: impl Into<PathBuf>, sandbox: Arc<dyn Sandbox>, code_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            sandbox,
            code_timeout,
        }
    }

    /// Executor that runs code through a [`ProcessSandbox`] under `root`
    pub fn with_process_sandbox(root: impl Into<PathBuf>, code_timeout: Duration) -> Self {
        let root = root.into();
        let sandbox = Arc::new(ProcessSandbox::new(&root));
        Self::new(root, sandbox, code_timeout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse `reply` and run every instruction in order
    pub async fn apply(&self, reply: &str) -> Vec<InstructionReport> {
        let mut reports = Vec::new();
        for instruction in parse_instructions(reply) {
            let outcome = self.execute(&instruction).await;
            match &outcome {
                Ok(_) => log::debug!("Instruction {} succeeded", instruction),
                Err(e) => log::warn!("Instruction {} failed: {}", instruction, e),
            }
            reports.push(InstructionReport {
                instruction,
                outcome,
            });
        }
        reports
    }

    /// Run a single instruction, returning the text reported back
    pub async fn execute(&self, instruction: &Instruction) -> Result<String> {
        match instruction {
            Instruction::CreateFile { path, content } => self.create_file(path, content).await,
            Instruction::ReadFile { path } => self.read_file(path).await,
            Instruction::ListFiles { dir } => self
                .list_files(dir)
                .await
                .map(|entries| entries.join("\n")),
            Instruction::RunCode { language, code } => self.run_code(language, code).await,
            Instruction::None => Err(Error::invalid_argument("no instruction to execute")),
        }
    }

    /// Write `content` to `path`, creating parent directories and overwriting
    pub async fn create_file(&self, path: &str, content: &str) -> Result<String> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::file_system(format!("{}: {}", path, e)))?;
        }

        tokio::fs::write(&target, content)
            .await
            .map_err(|e| Error::file_system(format!("{}: {}", path, e)))?;

        Ok(format!("File created: {}", path))
    }

    pub async fn read_file(&self, path: &str) -> Result<String> {
        let target = self.resolve(path)?;
        tokio::fs::read_to_string(&target)
            .await
            .map_err(|e| Error::from_io(e, path))
    }

    /// Entry names of `dir`, sorted; directories carry a trailing `/`
    pub async fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let target = self.resolve(dir)?;
        let mut reader = tokio::fs::read_dir(&target)
            .await
            .map_err(|e| Error::from_io(e, dir))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| Error::from_io(e, dir))?
        {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                name.push('/');
            }
            entries.push(name);
        }

        entries.sort();
        Ok(entries)
    }

    /// Run `code` in the sandbox; non-zero exits are errors carrying the output
    pub async fn run_code(&self, language: &str, code: &str) -> Result<String> {
        let output = self
            .sandbox
            .run(ExecutionRequest {
                code: code.to_string(),
                language: language.to_string(),
                timeout: self.code_timeout,
            })
            .await?;

        let captured = format!(
            "exit code {}\nstdout:\n{}\nstderr:\n{}",
            output.exit_code,
            output.stdout.trim_end(),
            output.stderr.trim_end()
        );

        if output.success() {
            Ok(captured)
        } else {
            Err(Error::execution(captured))
        }
    }

    /// Map a model-supplied relative path into the working directory
    fn resolve(&self, raw: &str) -> Result<PathBuf> {
        let path = Path::new(raw);
        let mut resolved = self.root.clone();
        let mut depth = 0usize;

        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(Error::file_system(format!(
                            "{}: path escapes the working directory",
                            raw
                        )));
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::file_system(format!(
                        "{}: absolute paths are not allowed",
                        raw
                    )));
                }
            }
        }

        Ok(resolved)
    }
}
