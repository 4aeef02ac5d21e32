//! Artefact naming policy for ISPC release archives.
//!
//! Constructs deterministic archive names in the upstream format
//! `ispc-<tag>-<platform><suffix><extension>`, where the suffix is empty,
//! `-oneapi`, or `.<arch>`.

use super::architecture::Architecture;
use super::platform::Platform;
use super::source::ReleaseSource;
use super::version::ReleaseVersion;
use std::fmt;

/// The fixed prefix for all archive names.
const ARTEFACT_PREFIX: &str = "ispc";

/// A fully-qualified release archive identity.
///
/// Built from a version, platform and architecture, this type yields the
/// archive file name, the download URL, and the directory the archive
/// unpacks to.
///
/// # Examples
///
/// ```
/// use setup_ispc::release::architecture::Architecture;
/// use setup_ispc::release::naming::ArtefactName;
/// use setup_ispc::release::platform::Platform;
/// use setup_ispc::release::source::ReleaseSource;
/// use setup_ispc::release::version::ReleaseVersion;
///
/// let version: ReleaseVersion = "1.21.0".try_into().expect("valid version");
/// let arch = Architecture::parse(Platform::Linux, "").expect("valid arch");
/// let name = ArtefactName::new(&version, Platform::Linux, &arch, &ReleaseSource::default());
///
/// assert_eq!(name.filename(), "ispc-v1.21.0-linux.tar.gz");
/// assert_eq!(
///     name.download_url(),
///     "https://github.com/ispc/ispc/releases/download/v1.21.0/ispc-v1.21.0-linux.tar.gz"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtefactName {
    archive_name: String,
    extension: &'static str,
    download_url: String,
    extracted_dir_name: String,
}

impl ArtefactName {
    /// Derive the archive identity from validated components.
    #[must_use]
    pub fn new(
        version: &ReleaseVersion,
        platform: Platform,
        architecture: &Architecture,
        source: &ReleaseSource,
    ) -> Self {
        let tag = source.tag_for(version.as_str());
        let stem = format!("{ARTEFACT_PREFIX}-{tag}-{platform}");
        let archive_name = format!("{stem}{}", architecture.archive_suffix());
        let extension = platform.archive_extension();
        let download_url = format!(
            "{}/{tag}/{archive_name}{extension}",
            source.download_base.trim_end_matches('/')
        );
        // The oneAPI archive unpacks to the unsuffixed directory name.
        let extracted_dir_name = if architecture.is_oneapi() {
            stem
        } else {
            archive_name.clone()
        };

        Self {
            archive_name,
            extension,
            download_url,
            extracted_dir_name,
        }
    }

    /// Return the archive name without extension.
    #[must_use]
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    /// Return the archive extension, including the leading dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Return the archive file name with extension.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }

    /// Return the URL the archive is published at.
    #[must_use]
    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    /// Return the top-level directory name inside the archive.
    #[must_use]
    pub fn extracted_dir_name(&self) -> &str {
        &self.extracted_dir_name
    }
}

impl fmt::Display for ArtefactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.archive_name, self.extension)
    }
}
