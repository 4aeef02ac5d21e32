//! CLI argument definitions for the ISPC setup helper.
//!
//! Each release input can also come from the environment variable a CI
//! runner sets for action inputs. Runners report unset inputs as empty
//! strings, so blank values are treated as absent.

use crate::error::{Result, SetupError};
use crate::output::GITHUB_PATH_ENV;
use crate::pipeline::SetupConfig;
use crate::resolution::ReleaseRequest;
use camino::Utf8PathBuf;
use clap::Parser;
use std::time::Duration;

/// Download, verify and expose an ISPC compiler release.
#[derive(Parser, Debug)]
#[command(name = "setup-ispc")]
#[command(version, about)]
#[command(long_about = concat!(
    "Download, verify and expose an ISPC compiler release.\n\n",
    "Resolves the requested release (the most recent one by default), downloads ",
    "the archive for the platform and architecture, extracts it into ",
    "ispc-releases/ under the workspace, checks that the compiler reports the ",
    "expected version and adds its bin directory to the job PATH.",
))]
#[command(after_help = concat!(
    "ARCHITECTURES:\n",
    "  linux     oneapi, aarch64, or empty (x86_64)\n",
    "  macOS     x86_64, arm64, universal (default)\n",
    "  windows   empty (x86_64)\n\n",
    "EXAMPLES:\n",
    "  Install the latest release for this host:\n",
    "    $ setup-ispc\n\n",
    "  Install a specific linux oneAPI build:\n",
    "    $ setup-ispc --ispc-version 1.21.0 --platform linux --architecture oneapi\n\n",
    "  Preview the download without fetching:\n",
    "    $ setup-ispc --dry-run",
))]
pub struct Cli {
    /// Release to install, or `latest`.
    #[arg(long = "ispc-version", env = "INPUT_VERSION", value_name = "VERSION")]
    pub ispc_version: Option<String>,

    /// Release platform: linux, macOS or windows [default: host].
    #[arg(long, env = "INPUT_PLATFORM", value_name = "PLATFORM")]
    pub platform: Option<String>,

    /// Platform-specific architecture qualifier [default: host].
    #[arg(long, env = "INPUT_ARCHITECTURE", value_name = "ARCH")]
    pub architecture: Option<String>,

    /// Directory receiving the archive and extracted release [default: current directory].
    #[arg(short, long, value_name = "DIR")]
    pub workspace: Option<Utf8PathBuf>,

    /// File to append the binary directory to for later CI steps.
    #[arg(long, env = GITHUB_PATH_ENV, value_name = "FILE")]
    pub github_path: Option<Utf8PathBuf>,

    /// Deadline in seconds for each HTTP request.
    #[arg(long, value_name = "SECS")]
    pub network_timeout: Option<u64>,

    /// Deadline in seconds for the compiler version check.
    #[arg(long, value_name = "SECS")]
    pub process_timeout: Option<u64>,

    /// Resolve the release and print the plan without downloading.
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Collect the release inputs, treating blank values as absent.
    #[must_use]
    pub fn release_request(&self) -> ReleaseRequest {
        ReleaseRequest {
            version: non_blank(self.ispc_version.as_deref()),
            platform: non_blank(self.platform.as_deref()),
            architecture: non_blank(self.architecture.as_deref()),
        }
    }

    /// Return the CI path file, ignoring an empty setting.
    #[must_use]
    pub fn github_path(&self) -> Option<&camino::Utf8Path> {
        self.github_path
            .as_deref()
            .filter(|path| !path.as_str().trim().is_empty())
    }

    /// Build the run configuration.
    ///
    /// A relative workspace is resolved against the current directory so
    /// the exported binary directory is always absolute.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidWorkspace`] when no workspace was given
    /// and the current directory is unavailable or not UTF-8.
    pub fn setup_config(&self) -> Result<SetupConfig> {
        let workspace_root = match &self.workspace {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => current_dir()?.join(dir),
            None => current_dir()?,
        };
        Ok(SetupConfig {
            network_timeout: self.network_timeout.map(Duration::from_secs),
            process_timeout: self.process_timeout.map(Duration::from_secs),
            quiet: self.quiet,
            ..SetupConfig::new(workspace_root)
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().map_err(|e| SetupError::InvalidWorkspace {
        reason: format!("cannot read current directory: {e}"),
    })?;
    Utf8PathBuf::from_path_buf(dir).map_err(|path| SetupError::InvalidWorkspace {
        reason: format!("current directory is not UTF-8: {}", path.display()),
    })
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
