//! Read-only scanning of installed plugins.
//!
//! Scanning never touches the network and never modifies the tree. A
//! plugin root may hold many unrelated plugins, so per-candidate anomalies
//! (foreign files, corrupt binaries, unverifiable sidecars) are skipped,
//! not errors; only directory-traversal failures propagate.

use std::path::Path;

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::Result;
use crate::options::ListInstallationsOptions;
use crate::requirement::{Install, Requirement};
use crate::version::parse_version;

impl Requirement {
    /// Lists verified installations of this plugin for the current
    /// platform.
    ///
    /// Walks `<root>/<host>/<namespace>/<name>` for every configured root
    /// and admits a binary only when all of the following hold:
    ///
    /// * its filename carries this plugin's prefix and the platform suffix;
    /// * a sidecar checksum file exists, parses, and matches the binary's
    ///   live digest;
    /// * the version segment is canonical (`v` prefix, no build metadata)
    ///   and satisfies the requirement's constraints;
    /// * the protocol version segment is compatible with the host.
    ///
    /// Survivors are sorted by descending semantic version, so the first
    /// element is the most recent installation. Finding nothing yields an
    /// empty vector, not an error. Duplicate installations of one version
    /// across roots are returned as-is.
    ///
    /// # Errors
    ///
    /// Only directory-traversal failures (e.g. permission errors inside an
    /// existing plugin directory) are returned; a missing root or plugin
    /// directory is not an error.
    pub fn list_installations(&self, opts: &ListInstallationsOptions) -> Result<Vec<Install>> {
        trace!(
            plugin = %self.identifier,
            constraints = %self.version_constraints,
            "listing potential installations"
        );

        let mut installs = Vec::new();
        for root in &opts.plugin_directories {
            self.scan_root(root, opts, &mut installs)?;
        }

        installs.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(installs)
    }

    fn scan_root(
        &self,
        root: &Path,
        opts: &ListInstallationsOptions,
        installs: &mut Vec<Install>,
    ) -> Result<()> {
        let plugin_dir = self.identifier.install_dir(root);
        if !plugin_dir.is_dir() {
            debug!(
                dir = %plugin_dir.display(),
                "directory does not exist, the plugin likely isn't installed here"
            );
            return Ok(());
        }

        let prefix = self.filename_prefix();
        let suffix = opts.binary_installation.filename_suffix();

        for entry in WalkDir::new(&plugin_dir).min_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(fname) = entry.file_name().to_str() else {
                continue;
            };
            if fname.len() < prefix.len() + suffix.len()
                || !fname.starts_with(&prefix)
                || !fname.ends_with(&suffix)
            {
                continue;
            }
            let path = entry.path();

            // A binary without a valid sidecar is unverifiable and must
            // never be reported as installed.
            let mut verified = None;
            for checksummer in &opts.binary_installation.checksummers {
                let expected = match checksummer.cached_checksum_of_file(path) {
                    Ok(digest) => digest,
                    Err(err) => {
                        trace!(binary = %path.display(), %err, "no usable sidecar checksum");
                        continue;
                    }
                };
                match checksummer.checksum_file(&expected, path) {
                    Ok(()) => {
                        verified = Some(hex::encode(expected));
                        break;
                    }
                    Err(err) => {
                        trace!(binary = %path.display(), %err, "live digest mismatch");
                    }
                }
            }
            let Some(checksum) = verified else {
                trace!(
                    binary = %path.display(),
                    "no checksum matched, ignoring possibly unsafe binary"
                );
                continue;
            };

            // The remainder between prefix and suffix holds the version and
            // the protocol version, e.g. "v1.2.3_x5.0".
            let middle = &fname[prefix.len()..fname.len() - suffix.len()];
            let Some((version_str, protocol_str)) = middle.split_once('_') else {
                trace!(binary = %path.display(), "filename lacks a protocol version segment");
                continue;
            };

            let version = match parse_version(version_str) {
                Ok(version) => version,
                Err(err) => {
                    trace!(binary = %path.display(), %err, "unparsable version, ignoring");
                    continue;
                }
            };
            if format!("v{version}") != version_str {
                trace!(
                    binary = %path.display(),
                    version = version_str,
                    "non-canonical version in filename could introduce ambiguity, ignoring"
                );
                continue;
            }
            if !version.build.is_empty() {
                trace!(
                    binary = %path.display(),
                    version = version_str,
                    "version carries build metadata, ignoring"
                );
                continue;
            }

            if !self.version_constraints.satisfies(&version) {
                trace!(
                    binary = %path.display(),
                    version = %version,
                    constraints = %self.version_constraints,
                    "version does not match constraints"
                );
                continue;
            }

            if let Err(err) = opts
                .binary_installation
                .check_protocol_version(protocol_str)
            {
                trace!(binary = %path.display(), %err, "incompatible protocol version");
                continue;
            }

            installs.push(Install {
                version,
                binary_path: path.to_path_buf(),
                checksum,
            });
        }

        Ok(())
    }
}
