//! Error types for the ISPC setup pipeline.
//!
//! Every variant is terminal: the pipeline stops at the first error and
//! its message is what the CI log shows.

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use crate::release::error::ReleaseError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, fetching and verifying ISPC.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A version, platform or architecture input was rejected.
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// Neither the release index nor the git tags yielded a version.
    #[error("unable to query latest ISPC version (release index: {primary}; git tags: {fallback})")]
    VersionDiscoveryFailed {
        /// Why the release-index lookup failed.
        primary: String,
        /// Why the git-tag fallback failed.
        fallback: String,
    },

    /// The archive could not be downloaded.
    #[error("download failed: {0}")]
    DownloadFailed(#[from] DownloadError),

    /// The archive extension is not one the extractor handles.
    #[error("unexpected file extension {extension} for {archive}")]
    UnsupportedArchiveFormat {
        /// The archive path.
        archive: Utf8PathBuf,
        /// The rejected extension.
        extension: String,
    },

    /// The archive could not be unpacked.
    #[error("extraction of {archive} failed: {source}")]
    ExtractionFailed {
        /// The archive path.
        archive: Utf8PathBuf,
        /// The underlying extraction failure.
        #[source]
        source: ExtractionError,
    },

    /// Extraction succeeded but the expected binary directory is absent.
    #[error("extracted archive has no binary directory at {path}")]
    BinDirMissing {
        /// Where the binary directory was expected.
        path: Utf8PathBuf,
    },

    /// The extracted executable could not be run or gave unusable output.
    #[error("unable to run {program}: {reason}")]
    ExecutionFailed {
        /// The executable that was invoked.
        program: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The extracted executable reports a different version.
    #[error("unable to match ispc version {expected} with {actual}")]
    VersionMismatch {
        /// The resolved version.
        expected: String,
        /// The version the executable reported.
        actual: String,
    },

    /// A git command used for version discovery failed.
    #[error("git {operation} failed: {message}")]
    Git {
        /// The git operation that failed (clone, fetch, etc.).
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// The workspace root could not be determined.
    #[error("invalid workspace: {reason}")]
    InvalidWorkspace {
        /// Description of the problem.
        reason: String,
    },

    /// The binary directory could not be exported to the CI environment.
    #[error("failed to export {path} to the job PATH: {source}")]
    ExportFailed {
        /// The file that could not be written.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`SetupError`].
pub type Result<T> = std::result::Result<T, SetupError>;
