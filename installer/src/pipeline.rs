//! Setup pipeline orchestration.
//!
//! Coordinates identity resolution, archive download, extraction and
//! version attestation. Every external effect goes through an injected
//! service so the whole flow can run against stubs.

use crate::artefact::download::{HttpTransport, download_to_file};
use crate::artefact::extraction::{ArtefactExtractor, ExtractionError};
use crate::attestation::{ExtractedToolchain, attest_version};
use crate::discovery::{GitTagSource, ReleaseIndexSource, discover_latest};
use crate::error::{Result, SetupError};
use crate::output::write_stderr_line;
use crate::process::CommandExecutor;
use crate::release::host::HostInfo;
use crate::release::naming::ArtefactName;
use crate::release::source::ReleaseSource;
use crate::resolution::{ReleaseIdentity, ReleaseRequest, resolve_identity};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::io::Write;
use std::time::Duration;

/// Directory under the workspace root that archives are extracted into.
pub const RELEASES_DIR: &str = "ispc-releases";

/// Directory inside an extracted release holding the executables.
const BIN_DIR: &str = "bin";

/// Settings for a setup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConfig {
    /// Directory receiving the archive and the extracted release.
    pub workspace_root: Utf8PathBuf,
    /// Where releases are discovered and downloaded from.
    pub source: ReleaseSource,
    /// Overall deadline for each HTTP request.
    pub network_timeout: Option<Duration>,
    /// Deadline for the `--version` check.
    pub process_timeout: Option<Duration>,
    /// Suppress progress output.
    pub quiet: bool,
}

impl SetupConfig {
    /// Configuration for `workspace_root` with upstream defaults.
    #[must_use]
    pub fn new(workspace_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            source: ReleaseSource::default(),
            network_timeout: None,
            process_timeout: None,
            quiet: false,
        }
    }
}

/// The external services a setup run depends on.
pub struct SetupServices<'a> {
    /// HTTP client for the release index and archive.
    pub transport: &'a dyn HttpTransport,
    /// Archive unpacker.
    pub extractor: &'a dyn ArtefactExtractor,
    /// Runner for the extracted compiler.
    pub tool_runner: &'a dyn CommandExecutor,
    /// Runner for git commands in tag discovery.
    pub git: &'a dyn CommandExecutor,
    /// Host identity used for autodetection.
    pub host: HostInfo,
}

/// Everything a run would do, computed without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPlan {
    /// The resolved release triple.
    pub identity: ReleaseIdentity,
    /// The archive to fetch.
    pub artefact: ArtefactName,
    /// Where the archive will be written.
    pub archive_path: Utf8PathBuf,
    /// Where the executables will be found.
    pub bin_dir: Utf8PathBuf,
}

impl SetupPlan {
    /// Lay out `identity` under the configured workspace.
    #[must_use]
    pub fn new(identity: ReleaseIdentity, config: &SetupConfig) -> Self {
        let artefact = identity.artefact_name(&config.source);
        let archive_path = config.workspace_root.join(artefact.filename());
        let bin_dir = bin_dir_for(&config.workspace_root, &artefact);
        Self {
            identity,
            artefact,
            archive_path,
            bin_dir,
        }
    }
}

/// Return the binary directory an extracted `artefact` provides.
#[must_use]
pub fn bin_dir_for(workspace_root: &Utf8Path, artefact: &ArtefactName) -> Utf8PathBuf {
    workspace_root
        .join(RELEASES_DIR)
        .join(artefact.extracted_dir_name())
        .join(BIN_DIR)
}

/// Resolve `request`, discovering the latest release when needed.
///
/// # Errors
///
/// Returns any resolution or discovery error.
pub fn plan_setup(
    config: &SetupConfig,
    request: &ReleaseRequest,
    services: &SetupServices<'_>,
) -> Result<SetupPlan> {
    let identity = resolve_identity(request, &services.host, || {
        let index = ReleaseIndexSource::new(services.transport, config.source.index_url.as_str());
        let tags = GitTagSource::new(
            services.git,
            config.source.repository_url.as_str(),
            &config.workspace_root,
        );
        discover_latest(&index, &tags)
    })?;
    Ok(SetupPlan::new(identity, config))
}

/// Download `artefact` into `workspace_root` and extract it.
///
/// The archive lands at `<workspace_root>/<file name>` and is extracted
/// into `<workspace_root>/ispc-releases`. Both are left in place.
///
/// Returns the binary directory of the extracted release.
///
/// # Errors
///
/// Returns [`SetupError::DownloadFailed`],
/// [`SetupError::UnsupportedArchiveFormat`],
/// [`SetupError::ExtractionFailed`], or [`SetupError::BinDirMissing`] when
/// the archive does not contain the expected layout.
pub fn fetch_and_extract(
    artefact: &ArtefactName,
    workspace_root: &Utf8Path,
    transport: &dyn HttpTransport,
    extractor: &dyn ArtefactExtractor,
) -> Result<Utf8PathBuf> {
    std::fs::create_dir_all(workspace_root)?;
    let archive_path = workspace_root.join(artefact.filename());
    let bytes = download_to_file(transport, artefact.download_url(), archive_path.as_std_path())?;
    info!("downloaded {bytes} bytes to {archive_path}");

    let releases_dir = workspace_root.join(RELEASES_DIR);
    let entries = extractor
        .extract(archive_path.as_std_path(), releases_dir.as_std_path())
        .map_err(|err| match err {
            ExtractionError::UnsupportedFormat { extension } => SetupError::UnsupportedArchiveFormat {
                archive: archive_path.clone(),
                extension,
            },
            source => SetupError::ExtractionFailed {
                archive: archive_path.clone(),
                source,
            },
        })?;
    info!("extracted {entries} entries into {releases_dir}");

    let bin_dir = bin_dir_for(workspace_root, artefact);
    if !bin_dir.is_dir() {
        return Err(SetupError::BinDirMissing { path: bin_dir });
    }
    Ok(bin_dir)
}

/// Run the full pipeline: resolve, fetch, extract and attest.
///
/// Progress lines go to `stderr` unless `config.quiet` is set. The
/// compiler's own `--version` output is forwarded to `stdout`/`stderr`.
///
/// # Errors
///
/// Returns the first error any stage produces.
pub fn run_setup(
    config: &SetupConfig,
    request: &ReleaseRequest,
    services: &SetupServices<'_>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<ExtractedToolchain> {
    let plan = plan_setup(config, request, services)?;

    if !config.quiet {
        write_stderr_line(stderr, format!("Resolved ISPC {}", plan.identity));
        write_stderr_line(stderr, format!("Downloading {}...", plan.artefact.download_url()));
    }

    let bin_dir = fetch_and_extract(
        &plan.artefact,
        &config.workspace_root,
        services.transport,
        services.extractor,
    )?;

    if !config.quiet {
        write_stderr_line(stderr, format!("Extracted to {bin_dir}"));
    }

    attest_version(
        services.tool_runner,
        &bin_dir,
        plan.identity.platform,
        &plan.identity.version,
        stdout,
        stderr,
    )
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
