//! External tool command builder and runner.

use std::collections::VecDeque;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// How long to keep reading stderr after the tool exits. A grandchild that
/// inherited the pipe can hold it open indefinitely.
const STDERR_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Builder for an external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a file path argument.
    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        self.arg(path.as_ref().to_string_lossy())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What to do with a tool's stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Log stderr at debug level and attach its tail to failures.
    #[default]
    Capture,
    /// Send both streams to the null device.
    Discard,
}

/// Runner for external tools with timeout and diagnostic handling.
///
/// Children are spawned with `kill_on_drop`, so dropping a pending `run`
/// future (for example when the HTTP client disconnects) terminates the tool.
#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    /// Wall-clock limit for the whole invocation
    timeout: Option<Duration>,
    output: OutputMode,
}

impl ToolRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set timeout if one is given.
    pub fn with_optional_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set output handling.
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run a command to completion. A non-zero exit status is an error.
    pub async fn run(&self, cmd: &ToolCommand) -> MediaResult<()> {
        debug!("Running tool: {}", cmd);

        let stderr = match self.output {
            OutputMode::Capture => Stdio::piped(),
            OutputMode::Discard => Stdio::null(),
        };

        let mut child = Command::new(cmd.program())
            .args(cmd.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => MediaError::ToolNotFound(cmd.program().to_string()),
                _ => MediaError::Io(e),
            })?;

        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(collect_stderr(cmd.program().to_string(), stderr)));

        let status = match self.wait_for_completion(cmd.program(), &mut child).await {
            Ok(status) => status,
            Err(e) => {
                if let Some(task) = stderr_task {
                    task.abort();
                }
                return Err(e);
            }
        };

        let stderr_tail = match stderr_task {
            Some(mut task) => match tokio::time::timeout(STDERR_DRAIN_GRACE, &mut task).await {
                Ok(tail) => tail.ok().filter(|tail| !tail.is_empty()),
                Err(_) => {
                    warn!(program = cmd.program(), "Tool left stderr open after exiting");
                    task.abort();
                    None
                }
            },
            None => None,
        };

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::tool_failed(cmd.program(), status.code(), stderr_tail))
        }
    }

    /// Wait for the child, killing it if the timeout expires.
    async fn wait_for_completion(&self, program: &str, child: &mut Child) -> MediaResult<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait().await?);
        };

        let wait = tokio::time::timeout(timeout, child.wait());
        match wait.await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!(program, "Tool timed out after {:?}, killing process", timeout);
                if let Err(e) = child.kill().await {
                    warn!(program, "Failed to kill timed out tool: {}", e);
                }
                Err(MediaError::Timeout {
                    program: program.to_string(),
                    timeout,
                })
            }
        }
    }
}

/// Log stderr lines and return the last few of them.
async fn collect_stderr(program: String, stderr: ChildStderr) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    while let Ok(Some(line)) = lines.next_line().await {
        debug!(program = %program, "{}", line);
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    Vec::from(tail).join("\n")
}

/// Resolve a tool on `PATH` (or as a literal path).
pub fn check_tool(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::ToolNotFound(program.to_string()))
}
