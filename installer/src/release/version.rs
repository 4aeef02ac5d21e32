//! Release version newtype.
//!
//! ISPC publishes releases as `MAJOR.MINOR.PATCH` tags with a leading `v`.
//! [`ReleaseVersion`] holds the bare numeric form and rejects anything
//! else at construction time.

use super::error::{ReleaseError, Result};
use std::fmt;

/// The keyword requesting discovery of the most recent release.
pub const LATEST_KEYWORD: &str = "latest";

/// A validated `MAJOR.MINOR.PATCH` release version.
///
/// # Examples
///
/// ```
/// use setup_ispc::release::version::ReleaseVersion;
///
/// let version: ReleaseVersion = "1.21.0".try_into().expect("valid version");
/// assert_eq!(version.as_str(), "1.21.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// Parse a version or release tag, stripping a single leading `v`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidVersion`] when the remainder is not
    /// `MAJOR.MINOR.PATCH`.
    ///
    /// # Examples
    ///
    /// ```
    /// use setup_ispc::release::version::ReleaseVersion;
    ///
    /// let version = ReleaseVersion::from_tag("v1.22.0").expect("valid tag");
    /// assert_eq!(version.as_str(), "1.22.0");
    /// ```
    pub fn from_tag(tag: &str) -> Result<Self> {
        Self::try_from(strip_tag_prefix(tag))
    }

    /// Locate the first `MAJOR.MINOR.PATCH` run inside free-form text.
    ///
    /// Used to read back the version a tool prints for `--version`.
    ///
    /// # Examples
    ///
    /// ```
    /// use setup_ispc::release::version::ReleaseVersion;
    ///
    /// let text = "Intel(r) Implicit SPMD Program Compiler (Intel(r) ISPC), 1.21.0 (build ...)";
    /// let found = ReleaseVersion::find_in(text).expect("version present");
    /// assert_eq!(found.as_str(), "1.21.0");
    /// ```
    #[must_use]
    pub fn find_in(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        (0..bytes.len())
            .filter(|&start| bytes.get(start).is_some_and(u8::is_ascii_digit))
            .find_map(|start| {
                let end = match_triplet_at(bytes, start)?;
                text.get(start..end).map(|found| Self(found.to_owned()))
            })
    }

    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Return `true` when the raw input asks for the most recent release.
///
/// An absent value, a blank string and the literal `latest` all qualify.
#[must_use]
pub fn is_latest_request(raw: Option<&str>) -> bool {
    raw.map(str::trim)
        .is_none_or(|value| value.is_empty() || value == LATEST_KEYWORD)
}

/// Strip one leading `v` from a release tag.
///
/// # Examples
///
/// ```
/// use setup_ispc::release::version::strip_tag_prefix;
///
/// assert_eq!(strip_tag_prefix("v1.21.0"), "1.21.0");
/// assert_eq!(strip_tag_prefix("1.21.0"), "1.21.0");
/// assert_eq!(strip_tag_prefix("vv1"), "v1");
/// ```
#[must_use]
pub fn strip_tag_prefix(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

impl TryFrom<&str> for ReleaseVersion {
    type Error = ReleaseError;

    fn try_from(value: &str) -> Result<Self> {
        validate_version(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = ReleaseError;

    fn try_from(value: String) -> Result<Self> {
        validate_version(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for ReleaseVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate that `value` is exactly three dot-separated digit runs.
fn validate_version(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(invalid(value, "version must not be empty"));
    }
    let components: Vec<&str> = value.split('.').collect();
    if components.len() != 3 {
        return Err(invalid(
            value,
            &format!(
                "expected MAJOR.MINOR.PATCH, found {} component(s)",
                components.len()
            ),
        ));
    }
    for component in components {
        if component.is_empty() {
            return Err(invalid(value, "version components must not be empty"));
        }
        if let Some(bad) = component.chars().find(|c| !c.is_ascii_digit()) {
            return Err(invalid(value, &format!("non-digit character '{bad}'")));
        }
    }
    Ok(())
}

fn invalid(value: &str, reason: &str) -> ReleaseError {
    ReleaseError::InvalidVersion {
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Match `digits '.' digits '.' digits` starting at `start`, returning the
/// exclusive end index of the greedy match.
fn match_triplet_at(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    for component in 0..3 {
        if component > 0 {
            if bytes.get(pos) != Some(&b'.') {
                return None;
            }
            pos += 1;
        }
        let run = bytes
            .get(pos..)?
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if run == 0 {
            return None;
        }
        pos += run;
    }
    Some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::typical("1.21.0")]
    #[case::multi_digit("10.200.3000")]
    #[case::zeros("0.0.0")]
    fn accepts_semantic_versions(#[case] value: &str) {
        let version = ReleaseVersion::try_from(value).expect("valid version");
        assert_eq!(version.as_str(), value);
    }

    #[rstest]
    #[case::empty("")]
    #[case::two_components("1.21")]
    #[case::four_components("1.21.0.1")]
    #[case::prefixed("v1.21.0")]
    #[case::suffix("1.21.0rc1")]
    #[case::empty_component("1..0")]
    #[case::whitespace(" 1.21.0")]
    #[case::latest("latest")]
    fn rejects_malformed_versions(#[case] value: &str) {
        let err = ReleaseVersion::try_from(value).expect_err("expected rejection");
        assert!(
            matches!(err, ReleaseError::InvalidVersion { .. }),
            "expected InvalidVersion, got {err:?}"
        );
    }

    #[test]
    fn from_tag_strips_single_prefix() {
        let version = ReleaseVersion::from_tag("v1.22.0").expect("valid tag");
        assert_eq!(version.as_str(), "1.22.0");
        assert!(ReleaseVersion::from_tag("vv1.22.0").is_err());
    }

    #[rstest]
    #[case::absent(None, true)]
    #[case::blank(Some("  "), true)]
    #[case::keyword(Some("latest"), true)]
    #[case::literal(Some("1.21.0"), false)]
    #[case::capitalised(Some("Latest"), false)]
    fn recognises_latest_requests(#[case] raw: Option<&str>, #[case] expected: bool) {
        assert_eq!(is_latest_request(raw), expected);
    }

    #[rstest]
    #[case::banner(
        "Intel(r) Implicit SPMD Program Compiler (Intel(r) ISPC), 1.21.0 (build commit 8d1 @ 20230911, LLVM 15.0.7)",
        Some("1.21.0")
    )]
    #[case::first_of_many("ispc 2.3.0, LLVM 17.0.6", Some("2.3.0"))]
    #[case::longer_run("1.2.3.4", Some("1.2.3"))]
    #[case::skips_partial("v1.2 then 3.4.5", Some("3.4.5"))]
    #[case::embedded("build12.30.456x", Some("12.30.456"))]
    #[case::missing("no version here", None)]
    #[case::two_parts_only("1.2", None)]
    fn finds_first_version_in_text(#[case] text: &str, #[case] expected: Option<&str>) {
        let found = ReleaseVersion::find_in(text);
        assert_eq!(found.as_ref().map(ReleaseVersion::as_str), expected);
    }

    #[test]
    fn display_shows_inner_value() {
        let version = ReleaseVersion::try_from("1.21.0").expect("known good");
        assert_eq!(format!("{version}"), "1.21.0");
    }
}
