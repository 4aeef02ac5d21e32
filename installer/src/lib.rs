//! ISPC setup library.
//!
//! This crate resolves a requested ISPC compiler release, downloads and
//! extracts the matching archive, and verifies that the extracted compiler
//! reports the expected version. It is used by the `setup-ispc` CLI binary
//! and can be driven programmatically with injected services for testing.
//!
//! # Modules
//!
//! - [`artefact`] - Archive download and extraction
//! - [`attestation`] - Version check of the extracted compiler
//! - [`cli`] - Command-line argument definitions
//! - [`discovery`] - Latest-release lookup with git tag fallback
//! - [`error`] - Semantic error types
//! - [`git`] - Git commands used by tag discovery
//! - [`output`] - Progress, CI workflow commands and PATH export
//! - [`pipeline`] - Setup pipeline orchestration
//! - [`process`] - External command execution
//! - [`release`] - Release version, platform, architecture and naming
//! - [`resolution`] - Release identity resolution

pub mod artefact;
pub mod attestation;
pub mod cli;
pub mod discovery;
pub mod error;
pub mod git;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod release;
pub mod resolution;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
