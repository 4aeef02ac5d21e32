//! Release identity resolution.
//!
//! Turns the loosely specified request a CI job provides into an exact
//! `(version, platform, architecture)` triple. Missing values are filled in
//! from the host and, for the version, from release discovery.

use crate::error::Result;
use crate::release::architecture::Architecture;
use crate::release::host::HostInfo;
use crate::release::naming::ArtefactName;
use crate::release::platform::Platform;
use crate::release::source::ReleaseSource;
use crate::release::version::{ReleaseVersion, is_latest_request};
use log::debug;
use std::fmt;

/// Raw, unvalidated inputs describing the wanted release.
///
/// `None` means the value was not supplied. A version of `latest` is
/// equivalent to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Requested version or `latest`.
    pub version: Option<String>,
    /// Requested platform (`linux`, `macOS` or `windows`).
    pub platform: Option<String>,
    /// Requested architecture qualifier.
    pub architecture: Option<String>,
}

/// A fully validated release triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIdentity {
    /// The exact release version.
    pub version: ReleaseVersion,
    /// The release platform.
    pub platform: Platform,
    /// The platform-scoped architecture qualifier.
    pub architecture: Architecture,
}

impl ReleaseIdentity {
    /// Locate the release archive for this identity in `source`.
    #[must_use]
    pub fn artefact_name(&self, source: &ReleaseSource) -> ArtefactName {
        ArtefactName::new(&self.version, self.platform, &self.architecture, source)
    }
}

impl fmt::Display for ReleaseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.architecture.is_empty() {
            write!(f, "{} {}", self.version, self.platform)
        } else {
            write!(f, "{} {} {}", self.version, self.platform, self.architecture)
        }
    }
}

/// Resolve the platform, detecting it from `host` when absent.
///
/// # Errors
///
/// Returns `UnsupportedPlatform` for an unknown explicit value or
/// `AutodetectionUnsupported` for an unknown host.
pub fn resolve_platform(raw: Option<&str>, host: &HostInfo) -> Result<Platform> {
    let platform = match raw {
        Some(value) => Platform::try_from(value)?,
        None => Platform::detect(host)?,
    };
    Ok(platform)
}

/// Resolve the architecture for an already resolved `platform`.
///
/// # Errors
///
/// Returns `UnsupportedArchitecture` for a value the platform does not
/// publish, or `AutodetectionUnsupported` when the host CPU has no archive.
pub fn resolve_architecture(
    platform: Platform,
    raw: Option<&str>,
    host: &HostInfo,
) -> Result<Architecture> {
    let architecture = match raw {
        Some(value) => Architecture::parse(platform, value)?,
        None => Architecture::detect(platform, host)?,
    };
    Ok(architecture)
}

/// Resolve the version, calling `discover` only for a `latest` request.
///
/// # Errors
///
/// Returns `InvalidVersion` for a malformed literal, or whatever
/// `discover` returns.
pub fn resolve_version<F>(raw: Option<&str>, discover: F) -> Result<ReleaseVersion>
where
    F: FnOnce() -> Result<ReleaseVersion>,
{
    if is_latest_request(raw) {
        return discover();
    }
    let literal = raw.map(str::trim).unwrap_or_default();
    Ok(ReleaseVersion::from_tag(literal)?)
}

/// Resolve a complete [`ReleaseIdentity`].
///
/// Platform and architecture are settled before the version so invalid
/// inputs fail without any network access.
///
/// # Errors
///
/// Returns the first error from [`resolve_platform`],
/// [`resolve_architecture`] or [`resolve_version`].
///
/// # Examples
///
/// ```
/// use setup_ispc::release::host::HostInfo;
/// use setup_ispc::resolution::{ReleaseRequest, resolve_identity};
///
/// let request = ReleaseRequest {
///     version: Some("1.21.0".to_owned()),
///     platform: Some("linux".to_owned()),
///     architecture: Some("x86_64".to_owned()),
/// };
/// let host = HostInfo::new("linux", "x86_64");
/// let identity = resolve_identity(&request, &host, || unreachable!("not latest"))
///     .expect("valid request");
/// assert!(identity.architecture.is_empty());
/// ```
pub fn resolve_identity<F>(
    request: &ReleaseRequest,
    host: &HostInfo,
    discover: F,
) -> Result<ReleaseIdentity>
where
    F: FnOnce() -> Result<ReleaseVersion>,
{
    let platform = resolve_platform(request.platform.as_deref(), host)?;
    let architecture = resolve_architecture(platform, request.architecture.as_deref(), host)?;
    let version = resolve_version(request.version.as_deref(), discover)?;
    let identity = ReleaseIdentity {
        version,
        platform,
        architecture,
    };
    debug!("resolved release identity: {identity}");
    Ok(identity)
}
