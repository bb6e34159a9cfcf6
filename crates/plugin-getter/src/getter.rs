//! Pluggable sources of plugin releases, checksums, and artifacts.
//!
//! A [`Getter`] turns a backend-specific payload into this crate's
//! canonical shapes. Which backend serves a requirement is chosen by
//! configuration; the resolution logic only ever talks to the trait.

use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::options::BinaryInstallationOptions;
use crate::requirement::Requirement;

/// The kind of data a [`Getter`] is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetWhat {
    /// The complete list of upstream releases, as canonical releases JSON.
    Releases,
    /// The SHA-256 checksum manifest for one release, as canonical
    /// checksum-manifest JSON.
    Sha256,
    /// The raw artifact bytes for one release and platform.
    Zip,
}

impl GetWhat {
    /// Stable lowercase name of the request kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Releases => "releases",
            Self::Sha256 => "sha256",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for GetWhat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context handed to a [`Getter`] with every request.
#[derive(Debug, Clone, Copy)]
pub struct GetOptions<'a> {
    /// The requirement under resolution.
    pub requirement: &'a Requirement,
    /// The caller's platform envelope.
    pub binary_installation: &'a BinaryInstallationOptions,
    /// The selected version; set for [`GetWhat::Sha256`] and
    /// [`GetWhat::Zip`], absent for [`GetWhat::Releases`].
    pub version: Option<&'a Version>,
    /// Artifact filename to fetch, known once the checksum manifest has
    /// been parsed; only set for [`GetWhat::Zip`].
    pub expected_artifact: Option<&'a str>,
}

impl GetOptions<'_> {
    /// Release tag for the selected version, e.g. `v1.2.3`.
    #[must_use]
    pub fn version_tag(&self) -> Option<String> {
        self.version.map(|v| format!("v{v}"))
    }
}

/// A source of release lists, checksum documents, and artifact bytes.
///
/// Implementations translate their backend's payloads into the canonical
/// shapes the resolution logic understands:
///
/// * [`GetWhat::Releases`]: a JSON array of `{"version": "X.Y.Z"}` objects
///   with no leading `v`, decodable by [`parse_releases`].
/// * [`GetWhat::Sha256`]: a JSON array of `{"filename", "checksum"}`
///   objects, one per published artifact of the release.
/// * [`GetWhat::Zip`]: the artifact's raw bytes, which the caller verifies
///   against the checksum manifest before anything touches disk.
///
/// Failures must be classified: an HTTP status of 400 or above and any
/// transport-level error surface as [`Error::Transport`](crate::Error),
/// rate limiting as [`Error::RateLimited`](crate::Error). Cancellation and
/// timeout policy belong to the implementation; this crate defines none.
pub trait Getter: Send + Sync {
    /// Produces the requested payload for the plugin named in `opts`.
    fn get(&self, what: GetWhat, opts: &GetOptions<'_>) -> Result<Vec<u8>>;
}

/// A version known to exist upstream, independent of any platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Version string without a leading `v`, e.g. `1.2.3`.
    pub version: String,
}

/// Decodes a canonical releases payload.
pub fn parse_releases(raw: &[u8]) -> Result<Vec<Release>> {
    Ok(serde_json::from_slice(raw)?)
}
