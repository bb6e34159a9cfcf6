//! Removing installed plugins.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::error::Result;
use crate::options::ListInstallationsOptions;
use crate::requirement::Requirement;

impl Requirement {
    /// Deletes every verified installation matching this requirement's
    /// constraint set and returns the removed binary paths.
    ///
    /// An empty constraint set removes all installed versions. Each removal
    /// deletes the binary together with its sidecar checksum file. Matching
    /// nothing yields an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns directory-traversal errors from the underlying scan and I/O
    /// errors from deleting a matched binary or sidecar.
    pub fn remove_installations(&self, opts: &ListInstallationsOptions) -> Result<Vec<PathBuf>> {
        let installs = self.list_installations(opts)?;

        let mut removed = Vec::with_capacity(installs.len());
        for install in installs {
            for checksummer in &opts.binary_installation.checksummers {
                let sidecar = checksummer.sidecar_path(&install.binary_path);
                if sidecar.exists() {
                    fs::remove_file(&sidecar)?;
                }
            }
            fs::remove_file(&install.binary_path)?;
            info!(
                plugin = %self.identifier,
                version = %install.version,
                binary = %install.binary_path.display(),
                "removed plugin"
            );
            removed.push(install.binary_path);
        }

        Ok(removed)
    }
}
