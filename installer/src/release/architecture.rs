//! Platform-scoped architecture qualifiers.
//!
//! Upstream archive names carry an optional architecture suffix whose valid
//! values depend on the platform. The empty string is a real member of the
//! set meaning "no suffix"; it is never used to mean "unset".

use super::error::{ReleaseError, Result};
use super::host::HostInfo;
use super::platform::Platform;
use std::fmt;

const LINUX_ARCHITECTURES: &[&str] = &["oneapi", "aarch64", ""];
const MACOS_ARCHITECTURES: &[&str] = &["x86_64", "arm64", "universal"];
const WINDOWS_ARCHITECTURES: &[&str] = &[""];

/// The accelerator-offload variant; it uses a hyphen separator and its
/// archive unpacks without the suffix.
const ONEAPI: &str = "oneapi";

/// Literal that linux and windows archives never carry as a suffix.
const X86_64: &str = "x86_64";

/// A validated architecture qualifier for a specific platform.
///
/// # Examples
///
/// ```
/// use setup_ispc::release::architecture::Architecture;
/// use setup_ispc::release::platform::Platform;
///
/// let arch = Architecture::parse(Platform::Linux, "x86_64").expect("valid");
/// assert!(arch.is_empty());
///
/// let arch = Architecture::parse(Platform::MacOs, "arm64").expect("valid");
/// assert_eq!(arch.archive_suffix(), ".arm64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Architecture(String);

impl Architecture {
    /// Return the architectures published for `platform`.
    #[must_use]
    pub const fn allowed(platform: Platform) -> &'static [&'static str] {
        match platform {
            Platform::Linux => LINUX_ARCHITECTURES,
            Platform::MacOs => MACOS_ARCHITECTURES,
            Platform::Windows => WINDOWS_ARCHITECTURES,
        }
    }

    /// Normalise and validate a user-supplied architecture for `platform`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::UnsupportedArchitecture`] when the value is
    /// not published for the platform.
    pub fn parse(platform: Platform, raw: &str) -> Result<Self> {
        let value = normalise(platform, raw);
        let allowed = Self::allowed(platform);
        if allowed.contains(&value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(ReleaseError::UnsupportedArchitecture {
                platform: platform.to_string(),
                value: raw.to_owned(),
                expected: describe_allowed(allowed),
            })
        }
    }

    /// Choose the architecture for `platform` from the host CPU.
    ///
    /// macOS always resolves to the universal archive and windows to the
    /// unsuffixed x86_64 archive; linux follows the host CPU.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::AutodetectionUnsupported`] for a linux host
    /// whose CPU has no published archive.
    pub fn detect(platform: Platform, host: &HostInfo) -> Result<Self> {
        let detected = match platform {
            Platform::Linux => match host.arch() {
                "aarch64" | "arm64" => "aarch64",
                "x86_64" | "x64" => "",
                other => {
                    return Err(ReleaseError::AutodetectionUnsupported {
                        what: "architecture",
                        value: other.to_owned(),
                    });
                }
            },
            Platform::MacOs => "universal",
            Platform::Windows => "",
        };
        Ok(Self(normalise(platform, detected).to_owned()))
    }

    /// Return the architecture as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the unsuffixed variant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this is the oneAPI offload variant.
    #[must_use]
    pub fn is_oneapi(&self) -> bool {
        self.0 == ONEAPI
    }

    /// Return the suffix appended to the platform in archive names.
    ///
    /// Empty for the unsuffixed variant, `-oneapi` for the offload variant
    /// and `.<arch>` for CPU variants.
    #[must_use]
    pub fn archive_suffix(&self) -> String {
        if self.is_empty() {
            String::new()
        } else if self.is_oneapi() {
            format!("-{}", self.0)
        } else {
            format!(".{}", self.0)
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map `x86_64` to the unsuffixed variant where archives never carry it.
fn normalise(platform: Platform, value: &str) -> &str {
    match platform {
        Platform::Linux | Platform::Windows if value == X86_64 => "",
        _ => value,
    }
}

fn describe_allowed(allowed: &[&str]) -> String {
    allowed
        .iter()
        .map(|arch| {
            if arch.is_empty() {
                "\"\" (none)".to_owned()
            } else {
                (*arch).to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALL_PLATFORMS: [Platform; 3] = [Platform::Linux, Platform::MacOs, Platform::Windows];

    const CANDIDATES: &[&str] = &[
        "", "oneapi", "aarch64", "x86_64", "arm64", "universal", "x64", "riscv64", "ONEAPI",
    ];

    #[test]
    fn accepts_every_allowed_member() {
        for platform in ALL_PLATFORMS {
            for arch in Architecture::allowed(platform) {
                let parsed = Architecture::parse(platform, arch).expect("allowed member");
                assert_eq!(parsed.as_str(), *arch);
            }
        }
    }

    #[test]
    fn rejects_everything_outside_allowed_set() {
        for platform in ALL_PLATFORMS {
            let allowed = Architecture::allowed(platform);
            for candidate in CANDIDATES {
                let normalised = normalise(platform, candidate);
                let result = Architecture::parse(platform, candidate);
                assert_eq!(
                    result.is_ok(),
                    allowed.contains(&normalised),
                    "{platform} / {candidate:?}"
                );
            }
        }
    }

    #[rstest]
    #[case::linux(Platform::Linux, true)]
    #[case::macos(Platform::MacOs, false)]
    #[case::windows(Platform::Windows, true)]
    fn empty_string_validity_is_platform_specific(
        #[case] platform: Platform,
        #[case] accepted: bool,
    ) {
        assert_eq!(Architecture::parse(platform, "").is_ok(), accepted);
    }

    #[rstest]
    #[case::linux(Platform::Linux)]
    #[case::windows(Platform::Windows)]
    fn x86_64_matches_detected_default(#[case] platform: Platform) {
        let supplied = Architecture::parse(platform, "x86_64").expect("normalised");
        let detected =
            Architecture::detect(platform, &HostInfo::new("linux", "x86_64")).expect("detected");
        assert_eq!(supplied, detected);
        assert!(supplied.is_empty());
    }

    #[test]
    fn x86_64_is_kept_on_macos() {
        let arch = Architecture::parse(Platform::MacOs, "x86_64").expect("valid");
        assert_eq!(arch.as_str(), "x86_64");
    }

    #[rstest]
    #[case::linux_arm(Platform::Linux, "aarch64", "aarch64")]
    #[case::linux_arm64(Platform::Linux, "arm64", "aarch64")]
    #[case::linux_x64(Platform::Linux, "x64", "")]
    #[case::macos_arm(Platform::MacOs, "aarch64", "universal")]
    #[case::macos_x86(Platform::MacOs, "x86_64", "universal")]
    #[case::windows_x86(Platform::Windows, "x86_64", "")]
    #[case::windows_arm(Platform::Windows, "aarch64", "")]
    fn detection_table(#[case] platform: Platform, #[case] cpu: &str, #[case] expected: &str) {
        let arch = Architecture::detect(platform, &HostInfo::new("any", cpu)).expect("detected");
        assert_eq!(arch.as_str(), expected);
    }

    #[test]
    fn linux_detection_rejects_unknown_cpu() {
        let err = Architecture::detect(Platform::Linux, &HostInfo::new("linux", "riscv64"))
            .expect_err("expected rejection");
        assert!(matches!(
            err,
            ReleaseError::AutodetectionUnsupported {
                what: "architecture",
                ..
            }
        ));
    }

    #[rstest]
    #[case::none(Platform::Linux, "", "")]
    #[case::oneapi(Platform::Linux, "oneapi", "-oneapi")]
    #[case::aarch64(Platform::Linux, "aarch64", ".aarch64")]
    #[case::universal(Platform::MacOs, "universal", ".universal")]
    fn archive_suffix_uses_expected_separator(
        #[case] platform: Platform,
        #[case] raw: &str,
        #[case] suffix: &str,
    ) {
        let arch = Architecture::parse(platform, raw).expect("valid");
        assert_eq!(arch.archive_suffix(), suffix);
    }

    #[test]
    fn error_lists_allowed_values() {
        let err = Architecture::parse(Platform::Windows, "arm64").expect_err("rejected");
        let msg = err.to_string();
        assert!(msg.contains("windows"));
        assert!(msg.contains("arm64"));
        assert!(msg.contains("(none)"));
    }
}
