//! Upstream locations for ISPC releases.
//!
//! Defaults point at the official GitHub project. Tests and mirrors
//! override individual fields.

/// Base URL under which release archives are published.
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://github.com/ispc/ispc/releases/download";

/// Release-index endpoint describing the most recent published release.
pub const DEFAULT_INDEX_URL: &str = "https://api.github.com/repos/ispc/ispc/releases/latest";

/// Git repository consulted when the release index is unavailable.
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/ispc/ispc.git";

/// Prefix upstream puts in front of the version in tags and archive names.
pub const DEFAULT_TAG_PREFIX: &str = "v";

/// Where releases are discovered and downloaded from.
///
/// # Examples
///
/// ```
/// use setup_ispc::release::source::ReleaseSource;
///
/// let source = ReleaseSource::default();
/// assert_eq!(source.tag_prefix, "v");
/// assert!(source.download_base.ends_with("/releases/download"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    /// Base URL; archives live at `<download_base>/<tag>/<file>`.
    pub download_base: String,
    /// Prefix joined to the version to form the release tag.
    pub tag_prefix: String,
    /// JSON endpoint whose `tag_name` names the latest release.
    pub index_url: String,
    /// Git remote used by the tag-based fallback discovery.
    pub repository_url: String,
}

impl ReleaseSource {
    /// Return the release tag for a bare version string.
    #[must_use]
    pub fn tag_for(&self, version: &str) -> String {
        format!("{}{version}", self.tag_prefix)
    }
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self {
            download_base: DEFAULT_DOWNLOAD_BASE.to_owned(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_owned(),
            index_url: DEFAULT_INDEX_URL.to_owned(),
            repository_url: DEFAULT_REPOSITORY_URL.to_owned(),
        }
    }
}
