//! Git operations backing tag-based release discovery.
//!
//! When the release index is unreachable, the most recent release tag is
//! read from a shallow clone of the upstream repository. Every command runs
//! through a [`CommandExecutor`]; production callers use
//! [`git_executor`], which bounds each command at five minutes.

use crate::error::{Result, SetupError};
use crate::process::{CommandExecutor, SystemCommandExecutor, stderr_message};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::process::Output;
use std::time::Duration;

/// Default timeout for git operations (5 minutes).
pub const GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Returns an executor that kills git commands after [`GIT_TIMEOUT`].
#[must_use]
pub const fn git_executor() -> SystemCommandExecutor {
    SystemCommandExecutor::with_timeout(Some(GIT_TIMEOUT))
}

/// Shallow-clones `url` into `target`.
///
/// Creates the parent directories if they do not exist.
///
/// # Errors
///
/// Returns `SetupError::Git` if the clone fails or times out.
pub fn shallow_clone(executor: &dyn CommandExecutor, url: &str, target: &Utf8Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    run_git(
        executor,
        &["clone", "--depth", "1", url, target.as_str()],
        None,
        "clone",
    )?;
    Ok(())
}

/// Fetches every tag of the remote into `repo`.
///
/// # Errors
///
/// Returns `SetupError::Git` if the fetch fails or times out.
pub fn fetch_tags(executor: &dyn CommandExecutor, repo: &Utf8Path) -> Result<()> {
    run_git(executor, &["fetch", "--tags"], Some(repo), "fetch")?;
    Ok(())
}

/// Returns the commit the most recently created tag points at.
///
/// # Errors
///
/// Returns `SetupError::Git` if the command fails or the repository has
/// no tags.
pub fn latest_tag_commit(executor: &dyn CommandExecutor, repo: &Utf8Path) -> Result<String> {
    let output = run_git(
        executor,
        &["rev-list", "--tags", "--max-count=1"],
        Some(repo),
        "rev-list",
    )?;
    first_line(&output).ok_or_else(|| SetupError::Git {
        operation: "rev-list",
        message: "repository has no tags".to_owned(),
    })
}

/// Returns the tag name describing `commit`.
///
/// # Errors
///
/// Returns `SetupError::Git` if the command fails or prints nothing.
pub fn describe_tag(executor: &dyn CommandExecutor, repo: &Utf8Path, commit: &str) -> Result<String> {
    let output = run_git(
        executor,
        &["describe", "--tags", commit],
        Some(repo),
        "describe",
    )?;
    first_line(&output).ok_or_else(|| SetupError::Git {
        operation: "describe",
        message: format!("no tag describes {commit}"),
    })
}

/// A clone directory that is removed when dropped.
///
/// Removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct CloneDir {
    path: Utf8PathBuf,
}

impl CloneDir {
    /// Take ownership of `path` for removal on drop.
    #[must_use]
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    /// Return the clone location.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Whether a previous run left a clone behind.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

impl Drop for CloneDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("removed tag clone at {}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove tag clone at {}: {e}", self.path),
        }
    }
}

/// Runs a git command and converts failures into `SetupError::Git`.
fn run_git(
    executor: &dyn CommandExecutor,
    args: &[&str],
    working_dir: Option<&Utf8Path>,
    operation: &'static str,
) -> Result<Output> {
    let output = executor
        .run("git", args, working_dir)
        .map_err(|err| match err {
            SetupError::Io(io) => SetupError::Git {
                operation,
                message: io.to_string(),
            },
            other => other,
        })?;

    if !output.status.success() {
        return Err(SetupError::Git {
            operation,
            message: stderr_message(&output),
        });
    }

    Ok(output)
}

fn first_line(output: &Output) -> Option<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_owned)
}
