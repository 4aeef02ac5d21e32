//! Host operating system and CPU identity.
//!
//! Autodetection reads these values instead of `std::env::consts` directly
//! so resolution can be exercised for any host in tests.

/// The operating system and CPU architecture the installer runs on.
///
/// # Examples
///
/// ```
/// use setup_ispc::release::host::HostInfo;
///
/// let host = HostInfo::new("linux", "aarch64");
/// assert_eq!(host.os(), "linux");
/// assert_eq!(host.arch(), "aarch64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    os: String,
    arch: String,
}

impl HostInfo {
    /// Create a host description from explicit identifiers.
    #[must_use]
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_owned(),
            arch: arch.to_owned(),
        }
    }

    /// Describe the host this binary was compiled for.
    #[must_use]
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Return the operating system identifier (e.g. `linux`, `macos`).
    #[must_use]
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Return the CPU architecture identifier (e.g. `x86_64`, `aarch64`).
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_matches_compile_target() {
        let host = HostInfo::current();
        assert_eq!(host.os(), std::env::consts::OS);
        assert_eq!(host.arch(), std::env::consts::ARCH);
    }
}
