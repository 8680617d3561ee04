//! Isolated execution of model-authored code snippets
//!
//! [`Sandbox`] is the seam the executor talks to. [`ProcessSandbox`] is the
//! local implementation: every snippet is written to a scratch directory and
//! run by the matching interpreter as a child process, killed when the timeout
//! expires. The process starts in the working directory, so snippets see the
//! same relative paths as the file instructions.

use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::process::Command;

/// Name of the scratch directory created under the working directory
pub const SANDBOX_DIR: &str = "code_execution_env";

/// Code submitted for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub code: String,
    pub language: String,
    pub timeout: Duration,
}

/// Captured result of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs code in isolation
///
/// Implementations return `Ok` for any run that finished, whatever its exit
/// code, and `Err(Error::Execution)` when the run timed out or could not start.
#[async_trait]
pub trait Sandbox: Send + Sync {
    async fn run(&self, request: ExecutionRequest) -> Result<ExecutionOutput>;
}

/// Sandbox backed by local interpreter processes
#[derive(Debug)]
pub struct ProcessSandbox {
    work_dir: PathBuf,
    root: PathBuf,
    counter: AtomicU64,
}

impl ProcessSandbox {
    /// Sandbox running in `work_dir`, with scripts kept in `work_dir/code_execution_env`
    pub fn new(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            root: work_dir.join(SANDBOX_DIR),
            counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Interpreter program and script extension for a language tag
fn interpreter_for(language: &str) -> Option<(&'static str, &'static str)> {
    match language {
        "python" | "python3" | "py" => Some(("python3", "py")),
        "bash" => Some(("bash", "sh")),
        "sh" | "shell" => Some(("sh", "sh")),
        "javascript" | "js" | "node" => Some(("node", "js")),
        "ruby" | "rb" => Some(("ruby", "rb")),
        _ => None,
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    async fn run(&self, request: ExecutionRequest) -> Result<ExecutionOutput> {
        let language = request.language.to_lowercase();
        let (program, extension) = interpreter_for(&language).ok_or_else(|| {
            Error::execution(format!("unsupported language '{}'", request.language))
        })?;

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            Error::execution(format!("cannot prepare {}: {}", self.root.display(), e))
        })?;

        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        let script = format!("process_{}_{}.{}", std::process::id(), id, extension);
        tokio::fs::write(self.root.join(&script), &request.code)
            .await
            .map_err(|e| Error::execution(format!("cannot write snippet: {}", e)))?;

        log::debug!(
            "Running {} snippet {} with {:?} timeout",
            language,
            script,
            request.timeout
        );

        // Relative to current_dir, which is the working directory
        let child = Command::new(program)
            .arg(Path::new(SANDBOX_DIR).join(&script))
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::execution(format!("failed to start {}: {}", program, e)))?;

        let result = tokio::time::timeout(request.timeout, child.wait_with_output()).await;

        // The snippet file is scratch; a failed cleanup is not worth surfacing
        if let Err(e) = tokio::fs::remove_file(self.root.join(&script)).await {
            log::debug!("Could not remove {}: {}", script, e);
        }

        let output = match result {
            Ok(output) => output.map_err(|e| Error::execution(e.to_string()))?,
            Err(_) => {
                return Err(Error::execution(format!(
                    "timed out after {}s",
                    request.timeout.as_secs_f32()
                )));
            }
        };

        Ok(ExecutionOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // Killed by a signal: no code, report as failure
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}
