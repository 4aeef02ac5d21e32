//! Shared test utilities for the setup crate.
//!
//! Available to unit tests and, through the `test-support` feature, to
//! integration tests.

use crate::artefact::download::{DownloadError, HttpReply, HttpTransport};
use crate::error::{Result, SetupError};
use crate::process::CommandExecutor;
use camino::Utf8Path;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(u32::from_ne_bytes(code.to_ne_bytes()))
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "git").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `cmd args...` and answer with `result`.
    #[must_use]
    pub fn new(cmd: &str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations in order and returns predefined
/// results. Any deviation is reported as [`SetupError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Returns true when every expected invocation has been consumed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.expected.borrow().is_empty()
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, program: &str, args: &[&str], _cwd: Option<&Utf8Path>) -> Result<Output> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(SetupError::StubMismatch {
                message: format!("unexpected invocation: {program} {}", args.join(" ")),
            });
        };

        if call.cmd != program || call.args != args {
            return Err(SetupError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{program} {}`",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        call.result
    }
}

/// A scripted `HttpTransport` answering from a URL-to-reply table.
///
/// Unknown URLs fail with a transport error, mimicking an unreachable host.
#[derive(Debug, Default)]
pub struct StubTransport {
    routes: HashMap<String, HttpReply>,
    requested: RefCell<Vec<String>>,
}

impl StubTransport {
    /// Creates an empty transport that fails every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and `body`.
    #[must_use]
    pub fn with_response(mut self, url: &str, status: u16, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_owned(),
            HttpReply {
                status,
                location: None,
                body: body.to_vec(),
            },
        );
        self
    }

    /// Answer `url` with a 302 pointing at `location`.
    #[must_use]
    pub fn with_redirect(mut self, url: &str, location: &str) -> Self {
        self.routes.insert(
            url.to_owned(),
            HttpReply {
                status: 302,
                location: Some(location.to_owned()),
                body: Vec::new(),
            },
        );
        self
    }

    /// Returns every URL requested so far, in order.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl HttpTransport for StubTransport {
    fn get(&self, url: &str) -> std::result::Result<HttpReply, DownloadError> {
        self.requested.borrow_mut().push(url.to_owned());
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| DownloadError::Transport {
                url: url.to_owned(),
                reason: "connection refused".to_owned(),
            })
    }
}

/// Build a release-index payload naming `tag` as the latest release.
#[must_use]
pub fn release_index_json(tag: &str) -> String {
    format!(r#"{{"tag_name":"{tag}","name":"ISPC {tag}","draft":false}}"#)
}

/// Write a gzip-compressed tarball containing `entries` to `path`.
///
/// Entries are regular files with mode `0o755`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create archive");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *contents)
            .expect("append entry");
    }
    let encoder = builder.into_inner().expect("tar finish");
    encoder.finish().expect("gzip finish");
}

/// Write a zip archive containing `entries` to `path`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create archive");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
    for (name, contents) in entries {
        writer.start_file(*name, options).expect("start entry");
        writer.write_all(contents).expect("write entry");
    }
    writer.finish().expect("zip finish");
}

/// Build release archive bytes holding a fake `ispc` that prints `version`.
///
/// The archive contains `<dir_name>/bin/ispc` (a shell script) and
/// `<dir_name>/bin/ispc.exe` with the same content, so it can stand in for
/// any platform's release in tests.
///
/// # Panics
///
/// Panics if the archive cannot be written.
#[must_use]
pub fn fake_release_archive(dir_name: &str, extension: &str, version: &str) -> Vec<u8> {
    let script = format!(
        "#!/bin/sh\necho \"Intel(r) Implicit SPMD Program Compiler (Intel(r) ISPC), {version} (build commit 0000000 @ 20240101, LLVM 17.0.6)\"\n"
    );
    let unix_entry = format!("{dir_name}/bin/ispc");
    let windows_entry = format!("{dir_name}/bin/ispc.exe");
    let entries: [(&str, &[u8]); 2] = [
        (unix_entry.as_str(), script.as_bytes()),
        (windows_entry.as_str(), script.as_bytes()),
    ];

    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join(format!("archive{extension}"));
    if extension == ".zip" {
        write_zip(&path, &entries);
    } else {
        write_tar_gz(&path, &entries);
    }
    std::fs::read(&path).expect("read archive")
}
