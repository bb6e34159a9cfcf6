//! Plugin dependency resolution and verified installation.
//!
//! This crate satisfies declared plugin requirements (a source address
//! plus a semantic version constraint) by locating a compatible,
//! already-installed binary, or by fetching, verifying, and installing
//! one from a remote source.
//!
//! # Architecture
//!
//! Resolution flows through a handful of small components:
//! - [`PluginIdentifier`] and [`Requirement`]: what to resolve
//! - [`Requirement::list_installations`]: the verified local inventory
//! - [`select`] over [`VersionConstraintSet`]: best-version choice
//! - [`Getter`]: pluggable source of releases, checksums, and artifacts
//! - [`Checksummer`]: digest computation and strict sidecar parsing
//! - [`Requirement::install_latest`] / [`Requirement::remove_installations`]:
//!   the orchestrated state changes
//!
//! # On-disk layout
//!
//! Each installed plugin is a binary below the configured root,
//!
//! ```text
//! <root>/<host>/<namespace>/<name>/packer-plugin-<name>_v<version>_x<maj>.<min>_<os>_<arch>[.exe]
//! ```
//!
//! paired with a `<binary>_SHA256SUM` sidecar holding exactly the binary's
//! lowercase hex digest. A binary is an installation only while its live
//! digest matches the sidecar; everything else is invisible to resolution.
//!
//! # Concurrency
//!
//! Every operation is a synchronous, blocking call with no shared mutable
//! state, usable concurrently for distinct requirements from multiple
//! threads or processes over one plugin directory. Safety rests on the
//! sidecar being written last (a half-written binary is simply invisible)
//! and on content-addressed validity rather than any lock.
//!
//! # Examples
//!
//! ```no_run
//! use plugin_getter::{
//!     ApiVersion, BinaryInstallationOptions, Checksummer, ListInstallationsOptions,
//!     Requirement,
//! };
//!
//! # fn main() -> plugin_getter::Result<()> {
//! let requirement = Requirement::new(
//!     "github.com/hashicorp/comment".parse()?,
//!     ">=0.2.0, <1.0.0".parse()?,
//! );
//!
//! let installs = requirement.list_installations(&ListInstallationsOptions {
//!     plugin_directories: vec!["/home/me/.plugins".into()],
//!     binary_installation: BinaryInstallationOptions {
//!         os: "linux".to_string(),
//!         arch: "amd64".to_string(),
//!         api_version: ApiVersion::new(5, 0),
//!         ext: String::new(),
//!         checksummers: vec![Checksummer::Sha256],
//!     },
//! })?;
//!
//! for install in installs {
//!     println!("{} {}", install.version, install.binary_path.display());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod addr;
mod api_version;
mod checksum;
mod error;
mod getter;
mod installer;
mod manifest;
mod options;
mod remove;
mod requirement;
mod scan;
mod version;

pub use addr::PluginIdentifier;
pub use api_version::ApiVersion;
pub use checksum::Checksummer;
pub use error::{Error, Result};
pub use getter::{GetOptions, GetWhat, Getter, Release, parse_releases};
pub use manifest::{
    ChecksumFileEntry, EntryIdentity, expected_artifact_filename, expected_filename,
    parse_checksum_file_entries,
};
pub use options::{BinaryInstallationOptions, InstallOptions, ListInstallationsOptions};
pub use requirement::{Install, Requirement};
pub use version::{Version, VersionConstraintSet, parse_version, select};
