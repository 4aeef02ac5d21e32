//! Output formatting for the setup CLI.
//!
//! Covers progress lines, the CI workflow commands used to report results,
//! exporting the binary directory to later job steps, and dry-run plans.

use crate::error::{Result, SetupError};
use crate::pipeline::SetupPlan;
use camino::Utf8Path;
use std::io::Write;

/// Environment variable naming the file whose lines are added to `PATH`
/// for subsequent CI steps.
pub const GITHUB_PATH_ENV: &str = "GITHUB_PATH";

/// Write a single line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Shell configuration snippets for different shells.
#[derive(Debug, Clone)]
pub struct ShellSnippet {
    /// Export line for bash/zsh.
    pub bash: String,
    /// Set line for fish shell.
    pub fish: String,
    /// Set line for PowerShell.
    pub powershell: String,
}

impl ShellSnippet {
    /// Create snippets prepending `bin_dir` to `PATH`.
    ///
    /// # Example
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use setup_ispc::output::ShellSnippet;
    ///
    /// let path = Utf8PathBuf::from("/work/ispc-releases/ispc-v1.21.0-linux/bin");
    /// let snippet = ShellSnippet::new(&path);
    ///
    /// assert!(snippet.bash.starts_with("export PATH="));
    /// ```
    #[must_use]
    pub fn new(bin_dir: &Utf8Path) -> Self {
        Self {
            bash: format!("export PATH=\"{bin_dir}:$PATH\""),
            fish: format!("fish_add_path \"{bin_dir}\""),
            powershell: format!("$env:PATH = \"{bin_dir};$env:PATH\""),
        }
    }

    /// Format the snippet for display to the user.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!(
            concat!(
                "Add ISPC to your PATH:\n\n",
                "  # bash/zsh\n",
                "  {}\n\n",
                "  # fish\n",
                "  {}\n\n",
                "  # PowerShell\n",
                "  {}"
            ),
            self.bash, self.fish, self.powershell
        )
    }
}

/// Format the message printed after a successful setup.
#[must_use]
pub fn success_message(version: &str) -> String {
    format!("ISPC ({version}) installation succeeded")
}

/// Format `error` as a workflow command that fails the CI step.
///
/// Line breaks are escaped as the workflow command syntax requires.
#[must_use]
pub fn failure_annotation(error: &dyn std::error::Error) -> String {
    let message = error
        .to_string()
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{message}")
}

/// Append `bin_dir` as one line to the CI path file at `path_file`.
///
/// # Errors
///
/// Returns [`SetupError::ExportFailed`] if the file cannot be opened or
/// written.
pub fn append_github_path(path_file: &Utf8Path, bin_dir: &Utf8Path) -> Result<()> {
    let export_failed = |source| SetupError::ExportFailed {
        path: path_file.to_owned(),
        source,
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path_file)
        .map_err(export_failed)?;
    writeln!(file, "{bin_dir}").map_err(export_failed)?;
    Ok(())
}

/// Make `bin_dir` available to later steps.
///
/// With a CI path file the directory is appended to it; otherwise shell
/// snippets are printed so a user can update `PATH` by hand.
///
/// # Errors
///
/// Returns any error from [`append_github_path`].
pub fn export_bin_dir(
    bin_dir: &Utf8Path,
    github_path: Option<&Utf8Path>,
    stderr: &mut dyn Write,
) -> Result<()> {
    match github_path {
        Some(path_file) => append_github_path(path_file, bin_dir),
        None => {
            write_stderr_line(stderr, ShellSnippet::new(bin_dir).display_text());
            Ok(())
        }
    }
}

/// Format a dry-run plan for display.
///
/// # Example
///
/// ```
/// use setup_ispc::pipeline::{SetupConfig, SetupPlan};
/// use setup_ispc::release::architecture::Architecture;
/// use setup_ispc::release::platform::Platform;
/// use setup_ispc::release::version::ReleaseVersion;
/// use setup_ispc::resolution::ReleaseIdentity;
/// use setup_ispc::output::dry_run_text;
///
/// let identity = ReleaseIdentity {
///     version: ReleaseVersion::try_from("1.21.0").expect("valid"),
///     platform: Platform::MacOs,
///     architecture: Architecture::parse(Platform::MacOs, "universal").expect("valid"),
/// };
/// let plan = SetupPlan::new(identity, &SetupConfig::new("/work"));
///
/// let output = dry_run_text(&plan);
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("ispc-v1.21.0-macOS.universal.tar.gz"));
/// ```
#[must_use]
pub fn dry_run_text(plan: &SetupPlan) -> String {
    let architecture = if plan.identity.architecture.is_empty() {
        "(none)"
    } else {
        plan.identity.architecture.as_str()
    };
    [
        "Dry run - nothing will be downloaded".to_owned(),
        String::new(),
        format!("Version: {}", plan.identity.version),
        format!("Platform: {}", plan.identity.platform),
        format!("Architecture: {architecture}"),
        format!("Download URL: {}", plan.artefact.download_url()),
        format!("Archive: {}", plan.archive_path),
        format!("Binary directory: {}", plan.bin_dir),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};

    /// Shared fixture providing a test binary directory.
    #[fixture]
    fn test_path() -> Utf8PathBuf {
        Utf8PathBuf::from("/home/runner/work/ispc-releases/ispc-v1.21.0-linux/bin")
    }

    /// Shared fixture providing a shell snippet for the test path.
    #[fixture]
    fn test_snippet(test_path: Utf8PathBuf) -> ShellSnippet {
        ShellSnippet::new(&test_path)
    }

    #[rstest]
    fn snippet_contains_path(test_snippet: ShellSnippet, test_path: Utf8PathBuf) {
        let path_str = test_path.as_str();
        assert!(test_snippet.bash.contains(path_str));
        assert!(test_snippet.fish.contains(path_str));
        assert!(test_snippet.powershell.contains(path_str));
    }

    #[rstest]
    fn bash_snippet_prepends_to_path(test_snippet: ShellSnippet) {
        assert!(test_snippet.bash.starts_with("export PATH="));
        assert!(test_snippet.bash.ends_with(":$PATH\""));
    }

    #[rstest]
    fn display_text_includes_all_shells(test_snippet: ShellSnippet) {
        let display = test_snippet.display_text();

        assert!(display.contains("bash/zsh"));
        assert!(display.contains("fish"));
        assert!(display.contains("PowerShell"));
    }

    #[test]
    fn success_message_names_version() {
        assert_eq!(success_message("1.21.0"), "ISPC (1.21.0) installation succeeded");
    }

    #[rstest]
    #[case::single_line("boom", "::error::boom")]
    #[case::multi_line("first\nsecond", "::error::first%0Asecond")]
    #[case::percent("100%", "::error::100%25")]
    fn failure_annotation_escapes_message(#[case] message: &str, #[case] expected: &str) {
        let error = std::io::Error::other(message.to_owned());
        assert_eq!(failure_annotation(&error), expected);
    }

    #[rstest]
    fn github_path_lines_are_appended(test_path: Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path_file = Utf8PathBuf::from_path_buf(temp.path().join("github_path")).expect("utf8");
        std::fs::write(&path_file, "/opt/other/bin\n").expect("seed path file");

        append_github_path(&path_file, &test_path).expect("append");

        let contents = std::fs::read_to_string(&path_file).expect("read path file");
        assert_eq!(contents, format!("/opt/other/bin\n{test_path}\n"));
    }

    #[rstest]
    fn export_without_path_file_prints_snippet(test_path: Utf8PathBuf) {
        let mut stderr = Vec::new();

        export_bin_dir(&test_path, None, &mut stderr).expect("export");

        let output = String::from_utf8(stderr).expect("utf8");
        assert!(output.contains(test_path.as_str()));
    }

    #[test]
    fn export_to_unwritable_path_file_fails() {
        let temp = tempfile::tempdir().expect("temp dir");
        let missing = Utf8PathBuf::from_path_buf(temp.path().join("missing/dir/github_path"))
            .expect("utf8");

        let err = export_bin_dir(Utf8Path::new("/bin"), Some(&missing), &mut Vec::new())
            .expect_err("unwritable");

        assert!(matches!(err, SetupError::ExportFailed { .. }));
    }
}
