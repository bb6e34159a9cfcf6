//! Digest computation and verification for plugin binaries.
//!
//! Every installed plugin binary is accompanied by a sidecar checksum file
//! (`<binary>_SHA256SUM`) holding exactly one lowercase hex digest and
//! nothing else. A binary with a missing or mismatching sidecar is treated
//! as not installed.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// A digest algorithm used to verify plugin artifacts.
///
/// Modeled as a closed set of variants chosen by configuration. SHA-256 is
/// the algorithm plugin release checksum files are published with.
///
/// # Examples
///
/// ```
/// use plugin_getter::Checksummer;
///
/// let checksummer = Checksummer::Sha256;
/// let digest = checksummer.sum(b"1");
///
/// assert_eq!(
///     hex::encode(&digest),
///     "6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b"
/// );
/// assert!(checksummer.checksum(&digest, b"1").is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Checksummer {
    /// SHA-256.
    Sha256,
}

impl Checksummer {
    /// Lowercase algorithm name, e.g. `"sha256"`.
    #[must_use]
    pub const fn algorithm(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Digest width in bytes.
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
        }
    }

    /// Computes the digest of `data`.
    #[must_use]
    pub fn sum(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    /// Verifies that `data` hashes to `expected`.
    ///
    /// The digest comparison runs in constant time. A mismatch is returned
    /// as [`Error::ChecksumMismatch`] carrying both digests; it is never
    /// reported as a warning.
    pub fn checksum(self, expected: &[u8], data: &[u8]) -> Result<()> {
        let actual = self.sum(data);
        if !constant_time_eq(&actual, expected) {
            return Err(Error::ChecksumMismatch {
                algorithm: self.algorithm(),
                expected: hex::encode(expected),
                actual: hex::encode(actual),
            });
        }
        Ok(())
    }

    /// Verifies that the file at `path` hashes to `expected`.
    pub fn checksum_file(self, expected: &[u8], path: &Path) -> Result<()> {
        let data = fs::read(path)?;
        self.checksum(expected, &data)
    }

    /// Parses a checksum document into a digest.
    ///
    /// The document must contain exactly one lowercase hex digest of this
    /// algorithm's width and nothing else. Filename columns, whitespace, or
    /// truncated digests are rejected; nothing is silently padded or
    /// truncated.
    pub fn parse_checksum(self, raw: &[u8]) -> Result<Vec<u8>> {
        let expected_len = self.digest_len() * 2;
        if raw.len() != expected_len {
            return Err(Error::MalformedChecksum {
                algorithm: self.algorithm(),
                reason: format!(
                    "expected exactly {expected_len} hex characters and nothing else, got {} bytes",
                    raw.len()
                ),
            });
        }
        if !raw
            .iter()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b))
        {
            return Err(Error::MalformedChecksum {
                algorithm: self.algorithm(),
                reason: "digest must be lowercase hex with no decoration".to_string(),
            });
        }
        // Only lowercase hex reaches this point, decoding cannot fail.
        hex::decode(raw).map_err(|e| Error::MalformedChecksum {
            algorithm: self.algorithm(),
            reason: e.to_string(),
        })
    }

    /// Sidecar filename suffix for this algorithm, e.g. `"_SHA256SUM"`.
    #[must_use]
    pub fn file_ext(self) -> String {
        format!("_{}SUM", self.algorithm().to_uppercase())
    }

    /// Path of the sidecar checksum file recorded next to `binary`.
    #[must_use]
    pub fn sidecar_path(self, binary: &Path) -> PathBuf {
        let mut name = binary.as_os_str().to_os_string();
        name.push(self.file_ext());
        PathBuf::from(name)
    }

    /// Reads and parses the sidecar checksum recorded next to `binary`.
    ///
    /// This does not hash the binary itself; combine with
    /// [`checksum_file`](Self::checksum_file) to verify the pair.
    pub fn cached_checksum_of_file(self, binary: &Path) -> Result<Vec<u8>> {
        let sidecar = self.sidecar_path(binary);
        let raw = fs::read(&sidecar)?;
        self.parse_checksum(&raw)
    }
}

/// Compares two digests without short-circuiting on the first differing
/// byte, so comparison time does not leak where a forged digest diverges.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (byte_a, byte_b) in a.iter().zip(b.iter()) {
        diff |= byte_a ^ byte_b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_OF_ONE: &str = "6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b";

    #[test]
    fn test_sum_known_digest() {
        assert_eq!(hex::encode(Checksummer::Sha256.sum(b"1")), SHA256_OF_ONE);
    }

    #[test]
    fn test_checksum_roundtrip() {
        let data = b"some plugin binary bytes";
        let digest = Checksummer::Sha256.sum(data);
        Checksummer::Sha256.checksum(&digest, data).unwrap();
    }

    #[test]
    fn test_checksum_detects_single_bit_flip() {
        let data = b"some plugin binary bytes".to_vec();
        let digest = Checksummer::Sha256.sum(&data);

        let mut mutated = data;
        mutated[0] ^= 0x01;

        let err = Checksummer::Sha256.checksum(&digest, &mutated).unwrap_err();
        match err {
            Error::ChecksumMismatch {
                algorithm,
                expected,
                actual,
            } => {
                assert_eq!(algorithm, "sha256");
                assert_eq!(expected, hex::encode(digest));
                assert_ne!(expected, actual);
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_checksum_accepts_bare_digest() {
        let digest = Checksummer::Sha256
            .parse_checksum(SHA256_OF_ONE.as_bytes())
            .unwrap();
        assert_eq!(hex::encode(digest), SHA256_OF_ONE);
    }

    #[test]
    fn test_parse_checksum_rejects_decoration() {
        // The sidecar format is a single digest with no filename column and
        // no trailing newline; anything else is malformed.
        let with_filename = format!("{SHA256_OF_ONE}  packer-plugin-comment");
        let with_newline = format!("{SHA256_OF_ONE}\n");
        let with_spaces = format!(" {SHA256_OF_ONE} ");

        for raw in [with_filename, with_newline, with_spaces] {
            let err = Checksummer::Sha256.parse_checksum(raw.as_bytes()).unwrap_err();
            assert!(
                matches!(err, Error::MalformedChecksum { .. }),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_checksum_rejects_truncated_digest() {
        let err = Checksummer::Sha256
            .parse_checksum(&SHA256_OF_ONE.as_bytes()[..32])
            .unwrap_err();
        assert!(matches!(err, Error::MalformedChecksum { .. }));
    }

    #[test]
    fn test_parse_checksum_rejects_uppercase() {
        let upper = SHA256_OF_ONE.to_uppercase();
        assert!(Checksummer::Sha256.parse_checksum(upper.as_bytes()).is_err());
    }

    #[test]
    fn test_file_ext() {
        assert_eq!(Checksummer::Sha256.file_ext(), "_SHA256SUM");
    }

    #[test]
    fn test_sidecar_path_appends_to_filename() {
        let sidecar = Checksummer::Sha256.sidecar_path(Path::new("/plugins/packer-plugin-x_v1.0.0_x5.0_linux_amd64"));
        assert_eq!(
            sidecar,
            Path::new("/plugins/packer-plugin-x_v1.0.0_x5.0_linux_amd64_SHA256SUM")
        );
    }

    #[test]
    fn test_cached_checksum_of_file() {
        let temp = tempfile::tempdir().unwrap();
        let binary = temp.path().join("packer-plugin-x_v1.0.0_x5.0_linux_amd64");
        fs::write(&binary, b"1").unwrap();
        fs::write(
            Checksummer::Sha256.sidecar_path(&binary),
            SHA256_OF_ONE.as_bytes(),
        )
        .unwrap();

        let cached = Checksummer::Sha256.cached_checksum_of_file(&binary).unwrap();
        Checksummer::Sha256.checksum_file(&cached, &binary).unwrap();
    }

    #[test]
    fn test_cached_checksum_missing_sidecar_is_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let binary = temp.path().join("packer-plugin-x_v1.0.0_x5.0_linux_amd64");
        fs::write(&binary, b"1").unwrap();

        let err = Checksummer::Sha256.cached_checksum_of_file(&binary).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
