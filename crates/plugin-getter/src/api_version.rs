//! Plugin protocol API versions.
//!
//! Plugin artifacts advertise the protocol version they speak in their
//! filename, as `x<major>.<minor>` (e.g. `x5.0`). A plugin is usable when
//! its major version equals the host's and its minor version does not
//! exceed the host's.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A plugin protocol version, e.g. `x5.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    /// Major protocol version; must match exactly between host and plugin.
    pub major: u64,
    /// Minor protocol version; the host accepts plugins up to its own minor.
    pub minor: u64,
}

impl ApiVersion {
    /// Builds an API version from its components.
    #[must_use]
    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    /// Checks whether a plugin speaking `remote` can be driven by a host
    /// speaking `self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleApiVersion`] naming both versions when
    /// the major versions differ or the remote minor version is newer than
    /// the host's.
    pub fn check_remote(self, remote: ApiVersion) -> Result<()> {
        if remote.major != self.major || remote.minor > self.minor {
            return Err(Error::IncompatibleApiVersion {
                remote: remote.to_string(),
                local: self.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    /// Parses `x<major>.<minor>`; the `x` prefix is optional.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = |reason: &str| Error::MalformedVersion {
            version: s.to_string(),
            reason: format!("{reason}, expected something like \"x5.0\""),
        };

        let bare = s.trim().trim_start_matches('x');
        let (major, minor) = bare
            .split_once('.')
            .ok_or_else(|| malformed("missing minor version"))?;

        Ok(Self {
            major: major
                .parse()
                .map_err(|_| malformed("major version is not a number"))?,
            minor: minor
                .parse()
                .map_err(|_| malformed("minor version is not a number"))?,
        })
    }
}
