//! Release identity: versions, platforms, architectures and archive naming.
//!
//! These types form the validated vocabulary the rest of the installer
//! works in. Each is constructed through validation, so holding one is
//! proof the value is publishable upstream.
//!
//! # Sub-modules
//!
//! - [`architecture`]: platform-scoped architecture qualifier (`Architecture`).
//! - [`error`]: validation error types.
//! - [`host`]: host OS and CPU identity (`HostInfo`).
//! - [`naming`]: archive naming and download URL policy (`ArtefactName`).
//! - [`platform`]: published platforms (`Platform`).
//! - [`source`]: upstream release locations (`ReleaseSource`).
//! - [`version`]: `MAJOR.MINOR.PATCH` newtype (`ReleaseVersion`).

pub mod architecture;
pub mod error;
pub mod host;
pub mod naming;
pub mod platform;
pub mod source;
pub mod version;
