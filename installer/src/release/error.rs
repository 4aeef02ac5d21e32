//! Error types for release identity validation.
//!
//! Each variant names the rejected input and the constraint it violated so
//! the message can be surfaced to the CI log unchanged.

use thiserror::Error;

/// Errors arising from invalid version, platform, or architecture values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseError {
    /// The version string is not `MAJOR.MINOR.PATCH`.
    #[error("invalid ISPC version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected version string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The requested platform is not one of the published platforms.
    #[error("platform {value} not in list of supported platforms: {expected}")]
    UnsupportedPlatform {
        /// The rejected platform string.
        value: String,
        /// Comma-separated list of accepted platforms.
        expected: String,
    },

    /// The requested architecture is not published for the platform.
    #[error("platform {platform} does not support architecture \"{value}\"; expected one of: {expected}")]
    UnsupportedArchitecture {
        /// The resolved platform name.
        platform: String,
        /// The rejected architecture string.
        value: String,
        /// Comma-separated list of accepted architectures.
        expected: String,
    },

    /// The host operating system or CPU could not be mapped automatically.
    #[error("cannot autodetect {what} from host value \"{value}\"; set it explicitly")]
    AutodetectionUnsupported {
        /// Which identity component was being detected.
        what: &'static str,
        /// The host-reported identifier.
        value: String,
    },
}

/// Result type alias using [`ReleaseError`].
pub type Result<T> = std::result::Result<T, ReleaseError>;
