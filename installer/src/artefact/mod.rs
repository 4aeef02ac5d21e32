//! Release archive retrieval: HTTP download and archive extraction.
//!
//! # Sub-modules
//!
//! - [`download`]: HTTP transport trait, redirect following, and
//!   buffered archive persistence.
//! - [`extraction`]: zip and gzip-tar extraction with path traversal
//!   protection.

pub mod download;
pub mod extraction;
