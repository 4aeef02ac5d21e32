//! Discovery of the most recent ISPC release.
//!
//! The release index is consulted first. If it is unreachable or returns
//! anything unusable, the newest tag of the upstream repository is used
//! instead. Both sources implement [`LatestReleaseSource`] so the
//! fallback policy in [`discover_latest`] can be tested in isolation.

use crate::artefact::download::{DownloadError, HttpTransport, fetch_following_redirects};
use crate::error::{Result, SetupError};
use crate::git::{CloneDir, describe_tag, fetch_tags, latest_tag_commit, shallow_clone};
use crate::process::CommandExecutor;
use crate::release::error::ReleaseError;
use crate::release::version::ReleaseVersion;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

/// Directory under the workspace root used for the tag fallback clone.
pub const TAG_CLONE_DIR: &str = ".ispc-tags";

/// Errors raised by a single discovery source.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The release index could not be fetched.
    #[error("release index request failed: {0}")]
    Request(#[from] DownloadError),

    /// The release index payload could not be decoded.
    #[error("malformed release index from {url}: {reason}")]
    MalformedIndex {
        /// The index URL.
        url: String,
        /// Decoder diagnostics.
        reason: String,
    },

    /// The discovered tag does not name a valid version.
    #[error("release tag {tag:?} is not a version: {source}")]
    InvalidTag {
        /// The offending tag.
        tag: String,
        /// The validation failure.
        #[source]
        source: ReleaseError,
    },

    /// A git command in the tag fallback failed.
    #[error(transparent)]
    Git(Box<SetupError>),
}

impl From<SetupError> for DiscoveryError {
    fn from(err: SetupError) -> Self {
        Self::Git(Box::new(err))
    }
}

/// A source able to name the most recent release.
#[cfg_attr(test, mockall::automock)]
pub trait LatestReleaseSource {
    /// Return the most recent release version.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscoveryError`] describing why the source could not
    /// produce a version.
    fn latest_version(&self) -> std::result::Result<ReleaseVersion, DiscoveryError>;
}

/// The subset of the release-index payload that discovery reads.
#[derive(Debug, Deserialize)]
struct ReleaseIndex {
    tag_name: String,
}

/// Reads the latest release from a JSON release-index endpoint.
pub struct ReleaseIndexSource<'a> {
    transport: &'a dyn HttpTransport,
    index_url: String,
}

impl<'a> ReleaseIndexSource<'a> {
    /// Query `index_url` through `transport`.
    #[must_use]
    pub fn new(transport: &'a dyn HttpTransport, index_url: impl Into<String>) -> Self {
        Self {
            transport,
            index_url: index_url.into(),
        }
    }
}

impl LatestReleaseSource for ReleaseIndexSource<'_> {
    fn latest_version(&self) -> std::result::Result<ReleaseVersion, DiscoveryError> {
        let body = fetch_following_redirects(self.transport, &self.index_url)?;
        let index: ReleaseIndex =
            serde_json::from_slice(&body).map_err(|e| DiscoveryError::MalformedIndex {
                url: self.index_url.clone(),
                reason: e.to_string(),
            })?;
        debug!("release index names tag {}", index.tag_name);
        version_from_tag(index.tag_name)
    }
}

/// Reads the latest release from the newest tag of a git repository.
///
/// The clone lives at a fixed path, is reused when a previous run left it
/// behind, and is removed once discovery finishes.
pub struct GitTagSource<'a> {
    executor: &'a dyn CommandExecutor,
    repository_url: String,
    clone_dir: Utf8PathBuf,
}

impl<'a> GitTagSource<'a> {
    /// Clone `repository_url` into [`TAG_CLONE_DIR`] under `workspace_root`.
    #[must_use]
    pub fn new(
        executor: &'a dyn CommandExecutor,
        repository_url: impl Into<String>,
        workspace_root: &Utf8Path,
    ) -> Self {
        Self {
            executor,
            repository_url: repository_url.into(),
            clone_dir: workspace_root.join(TAG_CLONE_DIR),
        }
    }
}

impl LatestReleaseSource for GitTagSource<'_> {
    fn latest_version(&self) -> std::result::Result<ReleaseVersion, DiscoveryError> {
        let clone = CloneDir::new(self.clone_dir.clone());
        if clone.exists() {
            debug!("reusing tag clone at {}", clone.path());
        } else {
            shallow_clone(self.executor, &self.repository_url, clone.path())?;
        }
        fetch_tags(self.executor, clone.path())?;
        let commit = latest_tag_commit(self.executor, clone.path())?;
        let tag = describe_tag(self.executor, clone.path(), &commit)?;
        debug!("newest tag {tag} at {commit}");
        version_from_tag(tag)
    }
}

/// Ask `primary` for the latest release, falling back to `fallback`.
///
/// # Errors
///
/// Returns [`SetupError::VersionDiscoveryFailed`] carrying both
/// diagnostics when neither source yields a version.
pub fn discover_latest(
    primary: &dyn LatestReleaseSource,
    fallback: &dyn LatestReleaseSource,
) -> Result<ReleaseVersion> {
    let primary_err = match primary.latest_version() {
        Ok(version) => {
            info!("latest ISPC release is {version}");
            return Ok(version);
        }
        Err(err) => err,
    };

    warn!("release index unavailable ({primary_err}); falling back to git tags");
    match fallback.latest_version() {
        Ok(version) => {
            info!("latest ISPC tag is {version}");
            Ok(version)
        }
        Err(fallback_err) => Err(SetupError::VersionDiscoveryFailed {
            primary: primary_err.to_string(),
            fallback: fallback_err.to_string(),
        }),
    }
}

fn version_from_tag(tag: String) -> std::result::Result<ReleaseVersion, DiscoveryError> {
    ReleaseVersion::from_tag(&tag).map_err(|source| DiscoveryError::InvalidTag { tag, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        ExpectedCall, StubExecutor, StubTransport, failure_output, release_index_json,
        stdout_output, success_output,
    };
    use rstest::{fixture, rstest};

    const INDEX_URL: &str = "https://api.example.test/releases/latest";

    #[fixture]
    fn workspace() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        (temp, root)
    }

    fn version(value: &str) -> ReleaseVersion {
        ReleaseVersion::try_from(value).expect("valid version")
    }

    #[test]
    fn index_source_strips_tag_prefix() {
        let transport =
            StubTransport::new().with_response(INDEX_URL, 200, release_index_json("v1.22.0").as_bytes());
        let source = ReleaseIndexSource::new(&transport, INDEX_URL);

        assert_eq!(source.latest_version().expect("version"), version("1.22.0"));
    }

    #[test]
    fn index_source_follows_redirects() {
        let moved = "https://api.example.test/moved";
        let transport = StubTransport::new()
            .with_redirect(INDEX_URL, moved)
            .with_response(moved, 200, release_index_json("v1.21.0").as_bytes());
        let source = ReleaseIndexSource::new(&transport, INDEX_URL);

        assert_eq!(source.latest_version().expect("version"), version("1.21.0"));
        assert_eq!(transport.requested(), vec![INDEX_URL.to_owned(), moved.to_owned()]);
    }

    #[rstest]
    #[case::missing_field(br#"{"name":"ISPC"}"#.as_slice())]
    #[case::not_json(b"<html>rate limited</html>".as_slice())]
    #[case::wrong_type(br#"{"tag_name":42}"#.as_slice())]
    fn index_source_rejects_malformed_payloads(#[case] body: &[u8]) {
        let transport = StubTransport::new().with_response(INDEX_URL, 200, body);
        let source = ReleaseIndexSource::new(&transport, INDEX_URL);

        let err = source.latest_version().expect_err("malformed");
        assert!(matches!(err, DiscoveryError::MalformedIndex { .. }));
    }

    #[test]
    fn index_source_rejects_non_version_tags() {
        let transport =
            StubTransport::new().with_response(INDEX_URL, 200, release_index_json("nightly").as_bytes());
        let source = ReleaseIndexSource::new(&transport, INDEX_URL);

        let err = source.latest_version().expect_err("invalid tag");
        assert!(matches!(err, DiscoveryError::InvalidTag { ref tag, .. } if tag == "nightly"));
    }

    #[test]
    fn index_source_reports_http_status() {
        let transport = StubTransport::new().with_response(INDEX_URL, 403, b"");
        let source = ReleaseIndexSource::new(&transport, INDEX_URL);

        let err = source.latest_version().expect_err("forbidden");
        assert!(err.to_string().contains("403"));
    }

    #[rstest]
    fn git_source_clones_and_describes(workspace: (tempfile::TempDir, Utf8PathBuf)) {
        let (_temp, root) = workspace;
        let clone = root.join(TAG_CLONE_DIR);
        let executor = StubExecutor::new(vec![
            ExpectedCall::new(
                "git",
                &["clone", "--depth", "1", "https://example.test/ispc.git", clone.as_str()],
                Ok(success_output()),
            ),
            ExpectedCall::new("git", &["fetch", "--tags"], Ok(success_output())),
            ExpectedCall::new(
                "git",
                &["rev-list", "--tags", "--max-count=1"],
                Ok(stdout_output("abc123\n")),
            ),
            ExpectedCall::new(
                "git",
                &["describe", "--tags", "abc123"],
                Ok(stdout_output("v1.20.0\n")),
            ),
        ]);
        let source = GitTagSource::new(&executor, "https://example.test/ispc.git", &root);

        assert_eq!(source.latest_version().expect("version"), version("1.20.0"));
        assert!(executor.is_finished());
    }

    #[rstest]
    fn git_source_reuses_and_removes_existing_clone(workspace: (tempfile::TempDir, Utf8PathBuf)) {
        let (_temp, root) = workspace;
        let clone = root.join(TAG_CLONE_DIR);
        std::fs::create_dir_all(&clone).expect("existing clone");
        let executor = StubExecutor::new(vec![
            ExpectedCall::new("git", &["fetch", "--tags"], Ok(success_output())),
            ExpectedCall::new(
                "git",
                &["rev-list", "--tags", "--max-count=1"],
                Ok(stdout_output("abc123\n")),
            ),
            ExpectedCall::new(
                "git",
                &["describe", "--tags", "abc123"],
                Ok(stdout_output("v1.20.0\n")),
            ),
        ]);
        let source = GitTagSource::new(&executor, "https://example.test/ispc.git", &root);

        source.latest_version().expect("version");

        assert!(executor.is_finished());
        assert!(!clone.exists());
    }

    #[rstest]
    fn git_source_removes_clone_on_failure(workspace: (tempfile::TempDir, Utf8PathBuf)) {
        let (_temp, root) = workspace;
        let clone = root.join(TAG_CLONE_DIR);
        std::fs::create_dir_all(&clone).expect("existing clone");
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "git",
            &["fetch", "--tags"],
            Ok(failure_output("fatal: unable to access remote")),
        )]);
        let source = GitTagSource::new(&executor, "https://example.test/ispc.git", &root);

        let err = source.latest_version().expect_err("fetch fails");

        assert!(err.to_string().contains("unable to access remote"));
        assert!(!clone.exists());
    }

    #[test]
    fn discover_latest_prefers_primary() {
        let mut primary = MockLatestReleaseSource::new();
        primary
            .expect_latest_version()
            .times(1)
            .returning(|| Ok(ReleaseVersion::try_from("1.22.0").expect("valid")));
        let mut fallback = MockLatestReleaseSource::new();
        fallback.expect_latest_version().never();

        assert_eq!(
            discover_latest(&primary, &fallback).expect("version"),
            version("1.22.0")
        );
    }

    #[test]
    fn discover_latest_falls_back_on_primary_failure() {
        let mut primary = MockLatestReleaseSource::new();
        primary.expect_latest_version().times(1).returning(|| {
            Err(DiscoveryError::Request(DownloadError::HttpStatus {
                status: 503,
                url: INDEX_URL.to_owned(),
            }))
        });
        let mut fallback = MockLatestReleaseSource::new();
        fallback
            .expect_latest_version()
            .times(1)
            .returning(|| Ok(ReleaseVersion::try_from("1.21.1").expect("valid")));

        assert_eq!(
            discover_latest(&primary, &fallback).expect("version"),
            version("1.21.1")
        );
    }

    #[test]
    fn discover_latest_reports_both_failures() {
        let mut primary = MockLatestReleaseSource::new();
        primary.expect_latest_version().returning(|| {
            Err(DiscoveryError::MalformedIndex {
                url: INDEX_URL.to_owned(),
                reason: "missing field `tag_name`".to_owned(),
            })
        });
        let mut fallback = MockLatestReleaseSource::new();
        fallback.expect_latest_version().returning(|| {
            Err(DiscoveryError::from(SetupError::Git {
                operation: "clone",
                message: "could not resolve host".to_owned(),
            }))
        });

        let err = discover_latest(&primary, &fallback).expect_err("both fail");
        let SetupError::VersionDiscoveryFailed { primary, fallback } = err else {
            panic!("expected VersionDiscoveryFailed, got {err:?}");
        };
        assert!(primary.contains("tag_name"));
        assert!(fallback.contains("could not resolve host"));
    }
}
