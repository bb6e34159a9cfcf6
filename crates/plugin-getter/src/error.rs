//! Error types for plugin resolution and installation.

use thiserror::Error;

/// Result type for plugin resolution and installation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, installing, or removing plugins.
///
/// Variants carry enough context (plugin identifier, attempted version,
/// both sides of a mismatch) to be surfaced verbatim to a user.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A plugin source address could not be parsed.
    ///
    /// Addresses must look like `github.com/hashicorp/happycloud`: a host
    /// followed by a namespace and a plugin name. A bad address is never
    /// guessed at; resolution stops here.
    #[error("invalid plugin source address {address:?}: {reason}")]
    MalformedAddress {
        /// The address string as given by the caller.
        address: String,
        /// Why the address was rejected.
        reason: String,
    },

    /// An asset filename does not follow the plugin naming convention.
    #[error("malformed filename {filename:?}, expected {expected}")]
    MalformedFilename {
        /// The offending filename.
        filename: String,
        /// The naming pattern the filename was checked against.
        expected: String,
    },

    /// A version string or version constraint could not be parsed.
    #[error("invalid version {version:?}: {reason}")]
    MalformedVersion {
        /// The version or constraint text as given.
        version: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A checksum document did not contain exactly one well-formed digest.
    ///
    /// Sidecar checksum files hold a single lowercase hex digest and nothing
    /// else. Extra whitespace, filename columns, or truncated digests are
    /// rejected rather than decoded leniently.
    #[error("invalid {algorithm} checksum: {reason}")]
    MalformedChecksum {
        /// Digest algorithm the document was parsed for.
        algorithm: &'static str,
        /// Why the document was rejected.
        reason: String,
    },

    /// Computed digest differs from the expected one.
    ///
    /// Always fatal to the operation that detected it; a mismatch is never
    /// reported as a warning.
    #[error("{algorithm} checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Digest algorithm used for the comparison.
        algorithm: &'static str,
        /// Expected digest, lowercase hex.
        expected: String,
        /// Digest computed over the actual bytes, lowercase hex.
        actual: String,
    },

    /// A checksum-manifest entry describes a different artifact than the one
    /// being resolved.
    #[error("wrong {what} in {filename:?}: expected {expected:?}, got {actual:?}")]
    EntryMismatch {
        /// Filename of the manifest entry.
        filename: String,
        /// Which identity field mismatched, e.g. `"version"` or `"system"`.
        what: &'static str,
        /// The value the resolution expected.
        expected: String,
        /// The value found in the entry.
        actual: String,
    },

    /// The remote plugin protocol version cannot be used by this host.
    ///
    /// Plugins are compatible when their protocol major version equals the
    /// host's and their minor version does not exceed the host's.
    #[error("unsupported plugin protocol version {remote}, this host speaks {local}")]
    IncompatibleApiVersion {
        /// Protocol version advertised by the plugin artifact.
        remote: String,
        /// Protocol version of the running host.
        local: String,
    },

    /// No version satisfies the requirement's constraints, locally or
    /// remotely. Reported to the caller, never retried.
    #[error("no version of plugin {identifier} matches constraints {constraints:?}")]
    NoMatchingVersion {
        /// The plugin under resolution.
        identifier: String,
        /// The constraint expression that could not be satisfied.
        constraints: String,
    },

    /// The selected release publishes no artifact for the local platform.
    #[error("no {os}/{arch} artifact for plugin {identifier} version {version}")]
    NoCompatibleArtifact {
        /// The plugin under resolution.
        identifier: String,
        /// The release that was inspected.
        version: String,
        /// Local operating system.
        os: String,
        /// Local architecture.
        arch: String,
    },

    /// An operation that must verify data was configured without any
    /// checksummer.
    #[error("no checksummer configured for plugin {identifier}")]
    NoChecksummer {
        /// The plugin under resolution.
        identifier: String,
    },

    /// A remote source could not be reached or answered with an error
    /// status. Classified apart from local I/O so callers can surface
    /// "offline" messaging.
    #[error("transport failure for {url}{}: {reason}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        /// The URL the request was sent to.
        url: String,
        /// HTTP status, when a response was received at all.
        status: Option<u16>,
        /// Underlying transport error text.
        reason: String,
    },

    /// The remote source rate limited the request.
    #[error("plugin host rate limited the request, try again {}", reset.as_deref().unwrap_or("later"))]
    RateLimited {
        /// Hint about when the rate limit window resets, if the host sent one.
        reset: Option<String>,
    },

    /// A getter was asked for something outside its contract.
    #[error("invalid {what:?} request: {reason}")]
    InvalidGetRequest {
        /// The kind of data requested.
        what: String,
        /// Why the request could not be served.
        reason: String,
    },

    /// An installation step failed; wraps the underlying failure with the
    /// plugin identity under resolution.
    #[error("installing plugin {identifier} {}: {source}", version.as_deref().unwrap_or("(no version selected)"))]
    Install {
        /// The plugin under resolution.
        identifier: String,
        /// The attempted version, when one had been selected.
        version: Option<String>,
        /// The failure that aborted the attempt.
        #[source]
        source: Box<Error>,
    },

    /// I/O error during directory traversal or file placement.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A canonical JSON payload (releases list, checksum manifest) failed to
    /// parse.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps a step failure with the plugin identity under resolution.
    pub(crate) fn install_context(
        identifier: impl Into<String>,
        version: Option<String>,
        source: Error,
    ) -> Self {
        Self::Install {
            identifier: identifier.into(),
            version,
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, unwrapping installation context.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Install { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns true if this failure came from the network rather than the
    /// local filesystem.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Transport { .. } | Self::RateLimited { .. }
        )
    }

    /// Returns true if this failure is an integrity violation.
    #[must_use]
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self.root_cause(), Self::ChecksumMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_mismatch_display() {
        let error = Error::ChecksumMismatch {
            algorithm: "sha256",
            expected: "a".repeat(64),
            actual: "b".repeat(64),
        };

        let display = format!("{error}");
        assert!(display.contains("checksum mismatch"));
        assert!(display.contains(&"a".repeat(64)));
        assert!(display.contains(&"b".repeat(64)));
    }

    #[test]
    fn test_install_context_carries_identity() {
        let inner = Error::ChecksumMismatch {
            algorithm: "sha256",
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        let error = Error::install_context(
            "github.com/hashicorp/comment",
            Some("1.2.3".to_string()),
            inner,
        );

        let display = format!("{error}");
        assert!(display.contains("github.com/hashicorp/comment"));
        assert!(display.contains("1.2.3"));
        assert!(error.is_checksum_mismatch());
        assert!(!error.is_transport());
    }

    #[test]
    fn test_transport_display_with_status() {
        let error = Error::Transport {
            url: "https://example.com/releases".to_string(),
            status: Some(503),
            reason: "Service Unavailable".to_string(),
        };

        let display = format!("{error}");
        assert!(display.contains("https://example.com/releases"));
        assert!(display.contains("HTTP 503"));
        assert!(error.is_transport());
    }

    #[test]
    fn test_transport_display_without_status() {
        let error = Error::Transport {
            url: "https://example.com".to_string(),
            status: None,
            reason: "connection refused".to_string(),
        };

        assert!(!format!("{error}").contains("HTTP"));
    }

    #[test]
    fn test_rate_limited_is_transport() {
        let error = Error::RateLimited {
            reset: Some("in 30m".to_string()),
        };
        assert!(error.is_transport());
        assert!(format!("{error}").contains("in 30m"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: Error = io_error.into();
        assert!(format!("{error}").contains("denied"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error as _;

        let inner = Error::NoMatchingVersion {
            identifier: "github.com/hashicorp/comment".to_string(),
            constraints: ">=2.0.0".to_string(),
        };
        let error = Error::install_context("github.com/hashicorp/comment", None, inner);
        assert!(error.source().is_some());
    }
}
