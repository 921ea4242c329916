use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::error::ProcessError;

/// A fully specified external program invocation
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    /// Kill the child after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl ProcessCommand {
    /// Command line for log and error messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// Non-blank stdout lines, trimmed
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            return ExitStatus::Success;
        }
        if let Some(code) = status.code() {
            return ExitStatus::Error(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitStatus::Signal(signal);
            }
        }
        ExitStatus::Error(1)
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

/// Runs programs with `tokio::process`, capturing stdout and stderr
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn spawn(command: &ProcessCommand) -> Result<tokio::process::Child, ProcessError> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProcessError::CommandNotFound(command.program.clone()),
            _ => ProcessError::Io(e),
        })
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        debug!("Executing subprocess: {}", command.display());
        if !command.env.is_empty() {
            trace!("Environment variables: {:?}", command.env);
        }

        let started = Instant::now();
        let child = Self::spawn(&command)?;
        let waiting = child.wait_with_output();
        let output = match command.timeout {
            // Dropping the future on timeout kills the child
            Some(limit) => tokio::time::timeout(limit, waiting)
                .await
                .map_err(|_| ProcessError::Timeout(limit))??,
            None => waiting.await?,
        };

        let result = ProcessOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: started.elapsed(),
        };

        match &result.status {
            ExitStatus::Success => debug!(
                "{} finished in {:?} ({} bytes of stdout)",
                command.program,
                result.duration,
                result.stdout.len()
            ),
            ExitStatus::Error(code) => {
                debug!("{} exited with {} in {:?}", command.program, code, result.duration);
                trace!("Stderr: {}", result.stderr);
            }
            ExitStatus::Signal(signal) => {
                warn!("{} killed by signal {}", command.program, signal)
            }
        }

        Ok(result)
    }
}
