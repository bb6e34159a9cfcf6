//! Checksum manifests and the artifact naming convention.
//!
//! Release artifacts follow a strict naming convention that encodes the
//! full compatibility envelope:
//!
//! ```text
//! packer-plugin-<name>_v<version>_x<major>.<minor>_<os>_<arch>[.<ext>]
//! ```
//!
//! The parser and the builder here are exact inverses: parsing a filename
//! produced by [`expected_filename`] reproduces the version and platform
//! it was built from.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::options::BinaryInstallationOptions;
use crate::requirement::Requirement;

/// One entry of a release checksum manifest: a published artifact filename
/// and its digest.
///
/// Entries are derived from the manifest payload a getter returns; they
/// are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumFileEntry {
    /// Artifact filename, e.g.
    /// `packer-plugin-comment_v0.2.12_x5.0_freebsd_amd64.zip`.
    pub filename: String,
    /// Hex digest of the artifact.
    pub checksum: String,
}

impl ChecksumFileEntry {
    /// Parses the identity facts encoded in this entry's filename.
    ///
    /// The filename must start with the requirement's
    /// [`filename_prefix`](Requirement::filename_prefix) and split into
    /// version, protocol version, OS, and architecture segments; anything
    /// else is a hard [`Error::MalformedFilename`] naming the expected
    /// pattern, never a partial parse.
    pub fn init(&self, requirement: &Requirement) -> Result<EntryIdentity> {
        let prefix = requirement.filename_prefix();
        let malformed = || Error::MalformedFilename {
            filename: self.filename.clone(),
            expected: format!("{prefix}{{version}}_x{{protocol-version}}_{{os}}_{{arch}}"),
        };

        let rest = self.filename.strip_prefix(&prefix).ok_or_else(malformed)?;

        // The extension starts at the first dot of the last underscore
        // segment; dots inside the version and protocol segments are not
        // extension separators.
        let last_segment_start = rest.rfind('_').map_or(0, |i| i + 1);
        let ext = rest[last_segment_start..]
            .find('.')
            .map_or("", |i| &rest[last_segment_start + i..]);
        let rest = &rest[..rest.len() - ext.len()];

        let parts: Vec<&str> = rest.split('_').collect();
        if parts.len() < 4 {
            return Err(malformed());
        }

        Ok(EntryIdentity {
            bin_version: parts[0].strip_prefix('v').unwrap_or(parts[0]).to_string(),
            protocol_version: parts[1].to_string(),
            os: parts[2].to_string(),
            arch: parts[3].to_string(),
            ext: ext.to_string(),
        })
    }
}

/// Identity facts parsed out of an artifact filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryIdentity {
    /// Version encoded in the filename, leading `v` stripped.
    pub bin_version: String,
    /// Protocol version segment, e.g. `x5.0`.
    pub protocol_version: String,
    /// Operating system segment.
    pub os: String,
    /// Architecture segment.
    pub arch: String,
    /// Extension including the dot, e.g. `.zip`, or empty.
    pub ext: String,
}

impl EntryIdentity {
    /// Cross-checks the parsed identity against the version being resolved
    /// and the caller's platform envelope.
    ///
    /// # Errors
    ///
    /// Every rejection names both the expected and the actual value:
    /// [`Error::EntryMismatch`] for version or platform,
    /// [`Error::IncompatibleApiVersion`] for the protocol version.
    pub fn validate(
        &self,
        expected_version: &Version,
        opts: &BinaryInstallationOptions,
        filename: &str,
    ) -> Result<()> {
        if self.bin_version != expected_version.to_string() {
            return Err(Error::EntryMismatch {
                filename: filename.to_string(),
                what: "version",
                expected: expected_version.to_string(),
                actual: self.bin_version.clone(),
            });
        }
        if self.os != opts.os || self.arch != opts.arch {
            return Err(Error::EntryMismatch {
                filename: filename.to_string(),
                what: "system",
                expected: format!("{}_{}", opts.os, opts.arch),
                actual: format!("{}_{}", self.os, self.arch),
            });
        }
        opts.check_protocol_version(&self.protocol_version)
    }
}

/// Decodes a canonical checksum-manifest payload.
pub fn parse_checksum_file_entries(raw: &[u8]) -> Result<Vec<ChecksumFileEntry>> {
    Ok(serde_json::from_slice(raw)?)
}

/// Builds the canonical binary filename for a requirement, version, and
/// platform:
/// `packer-plugin-<name>_v<version>_x<major>.<minor>_<os>_<arch><ext>`.
#[must_use]
pub fn expected_filename(
    requirement: &Requirement,
    version: &Version,
    opts: &BinaryInstallationOptions,
) -> String {
    format!(
        "{}v{version}_{}_{}_{}{}",
        requirement.filename_prefix(),
        opts.api_version,
        opts.os,
        opts.arch,
        opts.ext,
    )
}

/// Builds the canonical release artifact filename, which is the binary
/// filename with a `.zip` extension in place of the platform one.
#[must_use]
pub fn expected_artifact_filename(
    requirement: &Requirement,
    version: &Version,
    opts: &BinaryInstallationOptions,
) -> String {
    format!(
        "{}v{version}_{}_{}_{}.zip",
        requirement.filename_prefix(),
        opts.api_version,
        opts.os,
        opts.arch,
    )
}
