//! Option values passed explicitly into every operation.
//!
//! Platform facts (OS, architecture, protocol version, binary extension)
//! are never read from process-wide state; the caller resolves them once
//! and passes them in. No operation in this crate reads environment
//! variables.

use std::fmt;
use std::path::PathBuf;

use crate::api_version::ApiVersion;
use crate::checksum::Checksummer;
use crate::error::Result;
use crate::getter::Getter;

/// The caller's platform compatibility envelope, constant for a run.
///
/// # Examples
///
/// ```
/// use plugin_getter::{ApiVersion, BinaryInstallationOptions, Checksummer};
///
/// let opts = BinaryInstallationOptions {
///     os: "darwin".to_string(),
///     arch: "amd64".to_string(),
///     api_version: ApiVersion::new(5, 0),
///     ext: String::new(),
///     checksummers: vec![Checksummer::Sha256],
/// };
/// assert_eq!(opts.filename_suffix(), "_darwin_amd64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryInstallationOptions {
    /// Operating system binaries must be built for, e.g. `linux`.
    pub os: String,
    /// Architecture binaries must be built for, e.g. `amd64`.
    pub arch: String,
    /// Protocol version the host speaks.
    pub api_version: ApiVersion,
    /// Platform binary extension: `".exe"` on Windows, empty elsewhere.
    pub ext: String,
    /// Digest algorithms accepted when verifying binaries; at least one is
    /// required for a binary to be considered at all.
    pub checksummers: Vec<Checksummer>,
}

impl BinaryInstallationOptions {
    /// Filename suffix every compatible binary carries:
    /// `_<os>_<arch><ext>`.
    #[must_use]
    pub fn filename_suffix(&self) -> String {
        format!("_{}_{}{}", self.os, self.arch, self.ext)
    }

    /// Checks a remote protocol version string (e.g. `"x5.0"`) against the
    /// host's protocol version.
    pub fn check_protocol_version(&self, remote: &str) -> Result<()> {
        let remote: ApiVersion = remote.parse()?;
        self.api_version.check_remote(remote)
    }
}

/// Options for listing installed plugins.
#[derive(Debug, Clone)]
pub struct ListInstallationsOptions {
    /// Plugin roots to scan, in priority order.
    pub plugin_directories: Vec<PathBuf>,
    /// Platform envelope installed binaries must match.
    pub binary_installation: BinaryInstallationOptions,
}

/// Options for installing the best matching version of a plugin.
///
/// Exactly one [`Getter`] serves a resolution attempt. When it fails for
/// one kind of data after succeeding for another, the attempt fails with
/// that error; falling back to a different source is an explicit caller
/// decision, never an implicit one.
pub struct InstallOptions<'g> {
    /// Source of release lists, checksum documents, and artifact bytes.
    pub getter: &'g dyn Getter,
    /// Directory to install into.
    pub plugin_directory: PathBuf,
    /// Reinstall even when a valid installation already satisfies the
    /// requirement.
    pub force: bool,
    /// Platform envelope the installed binary must match.
    pub binary_installation: BinaryInstallationOptions,
}

impl fmt::Debug for InstallOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallOptions")
            .field("plugin_directory", &self.plugin_directory)
            .field("force", &self.force)
            .field("binary_installation", &self.binary_installation)
            .finish_non_exhaustive()
    }
}
