//! Archive extraction for ISPC release archives.
//!
//! Dispatches on the archive file name: `.zip` archives go through the
//! `zip` crate, `.tar.gz`/`.gz` archives through `flate2` and `tar`. Every
//! entry path, and every tar link target, is validated before extraction to
//! prevent zip-slip attacks.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

/// The archive encodings published upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// A zip archive (windows releases).
    Zip,
    /// A gzip-compressed tarball (linux and macOS releases).
    TarGz,
}

impl ArchiveFormat {
    /// Choose the format from the archive's file name.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnsupportedFormat`] for any other
    /// extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use setup_ispc::artefact::extraction::ArchiveFormat;
    ///
    /// let format = ArchiveFormat::from_path(Path::new("ispc-v1.21.0-linux.tar.gz"));
    /// assert_eq!(format.ok(), Some(ArchiveFormat::TarGz));
    /// ```
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("zip") => Ok(Self::Zip),
            Some("gz") => Ok(Self::TarGz),
            other => Err(ExtractionError::UnsupportedFormat {
                extension: other.map_or_else(String::new, |ext| format!(".{ext}")),
            }),
        }
    }
}

/// Trait for extracting archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use setup_ispc::artefact::extraction::ArchiveUnpacker;
///
/// let extractor = ArchiveUnpacker;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the number of entries extracted.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnsupportedFormat`] for unknown
    /// extensions, [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory,
    /// [`ExtractionError::EmptyArchive`] if no entries are found, and
    /// [`ExtractionError::Io`] or [`ExtractionError::Zip`] on read failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The archive extension is not one this extractor understands.
    #[error("unexpected file extension \"{extension}\"")]
    UnsupportedFormat {
        /// The rejected extension, including the leading dot.
        extension: String,
    },

    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container could not be read.
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no entries.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Default extractor using the `zip`, `flate2` and `tar` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveUnpacker;

impl ArtefactExtractor for ArchiveUnpacker {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError> {
        let format = ArchiveFormat::from_path(archive_path)?;
        std::fs::create_dir_all(dest_dir)?;
        let count = match format {
            ArchiveFormat::Zip => extract_zip(archive_path, dest_dir)?,
            ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir)?,
        };
        if count == 0 {
            return Err(ExtractionError::EmptyArchive);
        }
        Ok(count)
    }
}

fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError> {
    let file = File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    let mut extracted = 0;

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;

        let entry_type = entry.header().entry_type();
        if entry_type.is_symlink() || entry_type.is_hard_link() {
            let target = entry.link_name()?.map(std::borrow::Cow::into_owned);
            if let Some(target) = target {
                validate_link_target(&entry_path, &target, entry_type.is_symlink())?;
            }
        }

        // `unpack_in` refuses writes that resolve outside `dest_dir`.
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractionError::PathTraversal {
                path: entry_path.display().to_string(),
            });
        }
        extracted += 1;
    }

    Ok(extracted)
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let entry_path = PathBuf::from(entry.name());

        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if entry.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut output = File::create(&dest_path)?;
        std::io::copy(&mut entry, &mut output)?;
        apply_mode(&dest_path, entry.unix_mode())?;
    }

    Ok(archive.len())
}

/// Restore the permission bits recorded in a zip entry.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> std::io::Result<()> {
    Ok(())
}

/// Validate that an entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Validate that a link entry cannot point outside the destination.
///
/// Symlink targets resolve against the link's own directory; hard link
/// targets are archive paths relative to the destination root.
fn validate_link_target(
    entry_path: &Path,
    target: &Path,
    is_symlink: bool,
) -> Result<(), ExtractionError> {
    let mut depth = if is_symlink {
        entry_path.parent().map_or(0, |parent| {
            parent
                .components()
                .filter(|component| matches!(component, Component::Normal(_)))
                .count()
        })
    } else {
        0
    };

    let escapes = target.components().any(|component| match component {
        Component::Normal(_) => {
            depth += 1;
            false
        }
        Component::CurDir => false,
        Component::ParentDir => match depth.checked_sub(1) {
            Some(parent) => {
                depth = parent;
                false
            }
            None => true,
        },
        Component::RootDir | Component::Prefix(_) => true,
    });

    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: format!("{} -> {}", entry_path.display(), target.display()),
        });
    }
    Ok(())
}
