//! Platform identifiers used by ISPC release archives.
//!
//! Only three platform names appear in upstream archive names. Any other
//! value is rejected at construction time with a descriptive error.

use super::error::{ReleaseError, Result};
use super::host::HostInfo;
use std::fmt;

/// The platform names published by upstream, in archive-name spelling.
const SUPPORTED_PLATFORMS: &[&str] = &["linux", "macOS", "windows"];

/// A platform for which ISPC release archives are published.
///
/// # Examples
///
/// ```
/// use setup_ispc::release::platform::Platform;
///
/// let platform: Platform = "macOS".try_into().expect("valid platform");
/// assert_eq!(platform, Platform::MacOs);
/// assert_eq!(platform.as_str(), "macOS");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux archives (`ispc-<tag>-linux*.tar.gz`).
    Linux,
    /// macOS archives (`ispc-<tag>-macOS*.tar.gz`).
    MacOs,
    /// Windows archives (`ispc-<tag>-windows.zip`).
    Windows,
}

impl Platform {
    /// Return the platform name as spelled in archive names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macOS",
            Self::Windows => "windows",
        }
    }

    /// Return the full list of supported platform names.
    #[must_use]
    pub fn supported() -> &'static [&'static str] {
        SUPPORTED_PLATFORMS
    }

    /// Map the host operating system onto a platform.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::AutodetectionUnsupported`] when the host OS
    /// has no published archives.
    ///
    /// # Examples
    ///
    /// ```
    /// use setup_ispc::release::host::HostInfo;
    /// use setup_ispc::release::platform::Platform;
    ///
    /// let host = HostInfo::new("macos", "aarch64");
    /// assert_eq!(Platform::detect(&host), Ok(Platform::MacOs));
    /// ```
    pub fn detect(host: &HostInfo) -> Result<Self> {
        match host.os() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::MacOs),
            "windows" | "win32" => Ok(Self::Windows),
            other => Err(ReleaseError::AutodetectionUnsupported {
                what: "platform",
                value: other.to_owned(),
            }),
        }
    }

    /// Return the archive extension used for this platform's releases.
    #[must_use]
    pub const fn archive_extension(self) -> &'static str {
        match self {
            Self::Windows => ".zip",
            Self::Linux | Self::MacOs => ".tar.gz",
        }
    }

    /// Return the suffix appended to executable names.
    #[must_use]
    pub const fn executable_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux | Self::MacOs => "",
        }
    }
}

impl TryFrom<&str> for Platform {
    type Error = ReleaseError;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "linux" => Ok(Self::Linux),
            "macOS" => Ok(Self::MacOs),
            "windows" => Ok(Self::Windows),
            other => Err(ReleaseError::UnsupportedPlatform {
                value: other.to_owned(),
                expected: Self::supported().join(", "),
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
