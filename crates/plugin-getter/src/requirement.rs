//! Plugin requirements and verified installations.

use std::path::PathBuf;

use semver::Version;

use crate::addr::PluginIdentifier;
use crate::version::VersionConstraintSet;

/// A required plugin: an address plus the version constraints that an
/// installation must satisfy.
///
/// A requirement is the stateless unit of resolution. Each requirement
/// resolves independently; there is no constraint propagation between
/// plugins.
///
/// # Examples
///
/// ```
/// use plugin_getter::Requirement;
///
/// let req = Requirement::new(
///     "github.com/hashicorp/comment".parse().unwrap(),
///     ">=0.2.0, <1.0.0".parse().unwrap(),
/// );
/// assert_eq!(req.filename_prefix(), "packer-plugin-comment_");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Canonical plugin address.
    pub identifier: PluginIdentifier,
    /// Constraints a usable version must satisfy; empty means "latest".
    pub version_constraints: VersionConstraintSet,
}

impl Requirement {
    /// Builds a requirement from an address and a constraint set.
    #[must_use]
    pub const fn new(
        identifier: PluginIdentifier,
        version_constraints: VersionConstraintSet,
    ) -> Self {
        Self {
            identifier,
            version_constraints,
        }
    }

    /// Filename prefix every artifact of this plugin carries, including the
    /// trailing separator: `packer-plugin-<name>_`.
    #[must_use]
    pub fn filename_prefix(&self) -> String {
        format!("packer-plugin-{}_", self.identifier.name())
    }
}

/// A concrete, locally verified plugin binary satisfying a requirement for
/// the current platform.
///
/// An installation only exists while its binary's live digest equals the
/// digest recorded in its sidecar checksum file; the scanner never reports
/// unverifiable binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Install {
    /// Version of the installed binary.
    pub version: Version,
    /// Absolute or root-relative path of the binary.
    pub binary_path: PathBuf,
    /// Verified digest of the binary, lowercase hex.
    pub checksum: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_prefix() {
        let req = Requirement::new(
            "github.com/hashicorp/amazon".parse().unwrap(),
            VersionConstraintSet::default(),
        );
        assert_eq!(req.filename_prefix(), "packer-plugin-amazon_");
    }
}
