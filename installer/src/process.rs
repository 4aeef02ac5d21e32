//! External command execution with an optional deadline.
//!
//! Git discovery and version attestation both shell out. They do so
//! through [`CommandExecutor`] so tests can script command results.

use crate::error::{Result, SetupError};
use camino::Utf8Path;
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `program` with `args`, optionally inside `cwd`, and returns
    /// its captured stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning or waiting for the
    /// command, or [`SetupError::Io`] with [`std::io::ErrorKind::TimedOut`]
    /// when the deadline passes.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use setup_ispc::process::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor::default();
    /// let output = executor.run("git", &["--version"], None)?;
    /// assert!(output.status.success());
    /// # Ok::<(), setup_ispc::error::SetupError>(())
    /// ```
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Utf8Path>) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor {
    timeout: Option<Duration>,
}

impl SystemCommandExecutor {
    /// Create an executor that kills commands running longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Utf8Path>) -> Result<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = cwd {
            cmd.current_dir(dir.as_std_path());
        }

        let Some(timeout) = self.timeout else {
            return Ok(cmd.output()?);
        };

        let mut child = cmd.spawn()?;
        // Pipes are drained concurrently; a full pipe buffer stalls the child.
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        if let Some(status) = child.wait_timeout(timeout)? {
            Ok(Output {
                status,
                stdout: join_reader(stdout)?,
                stderr: join_reader(stderr)?,
            })
        } else {
            if child.kill().is_err() {
                // The child may have exited between the timeout and kill.
            }
            child.wait()?;
            // Readers are left detached: a grandchild may still hold the pipes.
            Err(SetupError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("{program} timed out after {} seconds", timeout.as_secs()),
            )))
        }
    }
}

type PipeReader = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

/// Read a child pipe to the end on a background thread.
fn spawn_reader<R>(pipe: Option<R>) -> PipeReader
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            pipe.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

/// Collect the bytes gathered by [`spawn_reader`].
fn join_reader(reader: PipeReader) -> Result<Vec<u8>> {
    let Some(handle) = reader else {
        return Ok(Vec::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::other("output reader thread panicked"))??;
    Ok(bytes)
}

/// Return trimmed stderr, or a placeholder when the command printed nothing.
#[must_use]
pub fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        format!("exited with {}", output.status)
    } else {
        trimmed.to_owned()
    }
}
