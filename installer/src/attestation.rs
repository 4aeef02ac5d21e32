//! Version attestation of an extracted ISPC toolchain.
//!
//! Runs the extracted compiler with `--version` and compares the first
//! `MAJOR.MINOR.PATCH` it prints with the resolved release version. An
//! [`ExtractedToolchain`] can only be obtained through [`attest_version`].

use crate::error::{Result, SetupError};
use crate::process::{CommandExecutor, stderr_message};
use crate::release::platform::Platform;
use crate::release::version::ReleaseVersion;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::io::Write;

/// Name of the compiler executable, without platform suffix.
pub const EXECUTABLE_STEM: &str = "ispc";

/// A binary directory whose compiler reported the expected version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedToolchain {
    bin_dir: Utf8PathBuf,
    version: ReleaseVersion,
}

impl ExtractedToolchain {
    /// Return the directory holding the compiler executable.
    #[must_use]
    pub fn bin_dir(&self) -> &Utf8Path {
        &self.bin_dir
    }

    /// Return the version the compiler reported.
    #[must_use]
    pub fn version(&self) -> &ReleaseVersion {
        &self.version
    }
}

/// Return the path of the compiler executable inside `bin_dir`.
#[must_use]
pub fn executable_path(bin_dir: &Utf8Path, platform: Platform) -> Utf8PathBuf {
    bin_dir.join(format!("{EXECUTABLE_STEM}{}", platform.executable_suffix()))
}

/// Run the compiler in `bin_dir` and confirm it reports `expected`.
///
/// The compiler's stdout is forwarded to `stdout` and its stderr to
/// `stderr` before the output is inspected.
///
/// # Errors
///
/// Returns [`SetupError::ExecutionFailed`] if the compiler cannot be
/// started, exits unsuccessfully, times out, or prints no version, and
/// [`SetupError::VersionMismatch`] if it reports a different version.
pub fn attest_version(
    executor: &dyn CommandExecutor,
    bin_dir: &Utf8Path,
    platform: Platform,
    expected: &ReleaseVersion,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<ExtractedToolchain> {
    let program = executable_path(bin_dir, platform);
    debug!("running {program} --version");

    let output = executor
        .run(program.as_str(), &["--version"], None)
        .map_err(|err| SetupError::ExecutionFailed {
            program: program.clone(),
            reason: err.to_string(),
        })?;

    forward(stdout, &output.stdout);
    forward(stderr, &output.stderr);

    if !output.status.success() {
        return Err(SetupError::ExecutionFailed {
            program,
            reason: stderr_message(&output),
        });
    }

    let reported = String::from_utf8_lossy(&output.stdout);
    let Some(actual) = ReleaseVersion::find_in(&reported) else {
        return Err(SetupError::ExecutionFailed {
            program,
            reason: "no version found in --version output".to_owned(),
        });
    };

    if actual != *expected {
        return Err(SetupError::VersionMismatch {
            expected: expected.to_string(),
            actual: actual.into_inner(),
        });
    }

    info!("{program} reports version {actual}");
    Ok(ExtractedToolchain {
        bin_dir: bin_dir.to_owned(),
        version: actual,
    })
}

fn forward(sink: &mut dyn Write, bytes: &[u8]) {
    if sink.write_all(bytes).and_then(|()| sink.flush()).is_err() {
        // Best-effort passthrough; ignore write failures.
    }
}
