//! Installing the best matching version of a plugin.
//!
//! A resolution attempt walks a fixed sequence: scan locally, fetch the
//! release list, select the best version, fetch and parse its checksum
//! manifest, fetch the artifact, verify it, and only then place the binary
//! followed by its sidecar. Any step failure aborts the whole attempt and
//! leaves the directory in its prior observable state; the scanner-visible
//! sidecar is always the last write.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::getter::{GetOptions, GetWhat, parse_releases};
use crate::manifest::parse_checksum_file_entries;
use crate::options::{InstallOptions, ListInstallationsOptions};
use crate::requirement::{Install, Requirement};
use crate::version::{parse_version, select};

/// Removes a freshly placed binary if the installation does not complete,
/// so a failed attempt never leaves a binary that a later successful
/// sidecar write could falsely validate.
struct PartialInstallGuard {
    path: PathBuf,
    cleanup: bool,
}

impl PartialInstallGuard {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            cleanup: true,
        }
    }

    /// Keeps the binary; call once the sidecar is on disk.
    fn commit(mut self) {
        self.cleanup = false;
    }
}

impl Drop for PartialInstallGuard {
    fn drop(&mut self) {
        if self.cleanup {
            if let Err(err) = fs::remove_file(&self.path) {
                warn!(
                    binary = %self.path.display(),
                    %err,
                    "failed to clean up partially installed binary"
                );
            } else {
                debug!(
                    binary = %self.path.display(),
                    "cleaned up partially installed binary"
                );
            }
        }
    }
}

impl Requirement {
    /// Ensures the best version satisfying this requirement is installed.
    ///
    /// Returns `Ok(None)` when a valid installation already satisfies the
    /// constraints and nothing was done, or `Ok(Some(install))` describing
    /// the freshly placed binary.
    ///
    /// # Errors
    ///
    /// * [`Error::NoMatchingVersion`] when neither the local inventory nor
    ///   the remote release list satisfies the constraints.
    /// * [`Error::NoCompatibleArtifact`] when the selected release has no
    ///   artifact for the local platform.
    /// * [`Error::Install`] wrapping any transport, parse, verification, or
    ///   placement failure with the plugin identifier and the attempted
    ///   version. A checksum mismatch aborts the attempt with nothing
    ///   installed.
    ///
    /// There is no retry and no fallback to another source; both are caller
    /// decisions.
    pub fn install_latest(&self, opts: &InstallOptions<'_>) -> Result<Option<Install>> {
        let binary_opts = &opts.binary_installation;
        let Some(checksummer) = binary_opts.checksummers.first().copied() else {
            return Err(Error::NoChecksummer {
                identifier: self.identifier.to_string(),
            });
        };

        let context = |version: Option<&Version>| {
            let identifier = self.identifier.to_string();
            let version = version.map(|v| v.to_string());
            move |err: Error| Error::install_context(identifier, version, err)
        };

        // A valid local installation satisfying the constraints wins over
        // any remote version; resolution ends without network use.
        if !opts.force {
            let scan = ListInstallationsOptions {
                plugin_directories: vec![opts.plugin_directory.clone()],
                binary_installation: binary_opts.clone(),
            };
            let installed = self.list_installations(&scan)?;
            if let Some(existing) = installed.first() {
                info!(
                    plugin = %self.identifier,
                    version = %existing.version,
                    binary = %existing.binary_path.display(),
                    "plugin already installed"
                );
                return Ok(None);
            }
        }

        debug!(plugin = %self.identifier, "getting available versions");
        let raw = opts
            .getter
            .get(
                GetWhat::Releases,
                &GetOptions {
                    requirement: self,
                    binary_installation: binary_opts,
                    version: None,
                    expected_artifact: None,
                },
            )
            .map_err(context(None))?;
        let releases = parse_releases(&raw).map_err(context(None))?;

        let mut candidates = Vec::with_capacity(releases.len());
        for release in &releases {
            match parse_version(&release.version) {
                Ok(version) => candidates.push(version),
                Err(err) => {
                    trace!(version = %release.version, %err, "unparsable release version, ignoring");
                }
            }
        }

        let Some(best) = select(&candidates, &self.version_constraints) else {
            return Err(Error::NoMatchingVersion {
                identifier: self.identifier.to_string(),
                constraints: self.version_constraints.to_string(),
            });
        };
        debug!(plugin = %self.identifier, version = %best, "selected version to install");

        let raw = opts
            .getter
            .get(
                GetWhat::Sha256,
                &GetOptions {
                    requirement: self,
                    binary_installation: binary_opts,
                    version: Some(&best),
                    expected_artifact: None,
                },
            )
            .map_err(context(Some(&best)))?;
        let entries = parse_checksum_file_entries(&raw).map_err(context(Some(&best)))?;

        // Find the manifest entry describing this platform's artifact.
        let mut artifact = None;
        for entry in entries {
            let identity = match entry.init(self) {
                Ok(identity) => identity,
                Err(err) => {
                    trace!(filename = %entry.filename, %err, "skipping manifest entry");
                    continue;
                }
            };
            if let Err(err) = identity.validate(&best, binary_opts, &entry.filename) {
                trace!(filename = %entry.filename, %err, "skipping manifest entry");
                continue;
            }
            let expected = checksummer
                .parse_checksum(entry.checksum.as_bytes())
                .map_err(context(Some(&best)))?;
            artifact = Some((entry, identity, expected));
            break;
        }
        let Some((entry, identity, expected_digest)) = artifact else {
            return Err(Error::NoCompatibleArtifact {
                identifier: self.identifier.to_string(),
                version: best.to_string(),
                os: binary_opts.os.clone(),
                arch: binary_opts.arch.clone(),
            });
        };

        // The binary keeps the artifact's name with the platform extension
        // in place of the archive one.
        let binary_name = format!(
            "{}{}",
            entry
                .filename
                .strip_suffix(&identity.ext)
                .unwrap_or(&entry.filename),
            binary_opts.ext
        );
        let output_dir = self.identifier.install_dir(&opts.plugin_directory);
        let output_path = output_dir.join(&binary_name);

        // The selected version may already sit at the target path with a
        // valid sidecar, e.g. placed by a concurrent resolution.
        if !opts.force {
            for potential in &binary_opts.checksummers {
                if let Ok(cached) = potential.cached_checksum_of_file(&output_path) {
                    if potential.checksum_file(&cached, &output_path).is_ok() {
                        info!(
                            plugin = %self.identifier,
                            version = %best,
                            binary = %output_path.display(),
                            "plugin is already correctly installed"
                        );
                        return Ok(None);
                    }
                }
            }
        }

        debug!(plugin = %self.identifier, artifact = %entry.filename, "fetching artifact");
        let data = opts
            .getter
            .get(
                GetWhat::Zip,
                &GetOptions {
                    requirement: self,
                    binary_installation: binary_opts,
                    version: Some(&best),
                    expected_artifact: Some(&entry.filename),
                },
            )
            .map_err(context(Some(&best)))?;

        // Nothing touches disk until the bytes verify.
        checksummer
            .checksum(&expected_digest, &data)
            .map_err(context(Some(&best)))?;

        fs::create_dir_all(&output_dir).map_err(|err| context(Some(&best))(err.into()))?;
        let guard = PartialInstallGuard::new(output_path.clone());
        write_executable(&output_path, &data).map_err(|err| context(Some(&best))(err.into()))?;

        // The sidecar is written last: a concurrent scanner either sees no
        // sidecar (binary invisible) or a sidecar matching a complete
        // binary.
        let sidecar = checksummer.sidecar_path(&output_path);
        fs::write(&sidecar, hex::encode(&expected_digest))
            .map_err(|err| context(Some(&best))(err.into()))?;
        guard.commit();

        info!(
            plugin = %self.identifier,
            version = %best,
            binary = %output_path.display(),
            "installed plugin"
        );

        Ok(Some(Install {
            version: best,
            binary_path: output_path,
            checksum: hex::encode(expected_digest),
        }))
    }
}

#[cfg(unix)]
fn write_executable(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o755)
        .open(path)?;
    file.write_all(data)
}

#[cfg(not(unix))]
fn write_executable(path: &Path, data: &[u8]) -> std::io::Result<()> {
    fs::write(path, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_install_guard_cleanup() {
        let temp = TempDir::new().unwrap();
        let binary = temp.path().join("partial");
        fs::write(&binary, b"half written").unwrap();

        {
            let _guard = PartialInstallGuard::new(binary.clone());
        }

        assert!(!binary.exists());
    }

    #[test]
    fn test_partial_install_guard_commit() {
        let temp = TempDir::new().unwrap();
        let binary = temp.path().join("complete");
        fs::write(&binary, b"fully written").unwrap();

        {
            let guard = PartialInstallGuard::new(binary.clone());
            guard.commit();
        }

        assert!(binary.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_executable_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let binary = temp.path().join("bin");
        write_executable(&binary, b"#!/bin/sh\n").unwrap();

        let mode = fs::metadata(&binary).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
