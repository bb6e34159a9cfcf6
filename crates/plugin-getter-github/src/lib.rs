//! GitHub release backend for plugin resolution.
//!
//! Plugins are conventionally published as GitHub releases of a
//! `packer-plugin-<name>` repository, with one tag per version and, per
//! release, a `SHA256SUMS` document plus one zip artifact per platform.
//! [`GithubGetter`] translates those payloads into the canonical shapes
//! the resolution engine consumes:
//!
//! * tags (`[{"name": "v1.2.3"}, ...]`) become the releases JSON array,
//!   with the leading `v` stripped;
//! * the `SHA256SUMS` text document (`<digest>  <filename>` per line)
//!   becomes the checksum-manifest JSON array;
//! * the platform zip is streamed through as raw bytes.
//!
//! All requests are synchronous. The request timeout is the only
//! cancellation policy; it is configured on construction.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

use std::time::Duration;

use plugin_getter::{
    ChecksumFileEntry, Error, GetOptions, GetWhat, Getter, Release, Requirement, Result,
    expected_artifact_filename,
};
use serde::Deserialize;
use tracing::{debug, trace};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_DOWNLOAD_BASE: &str = "https://github.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("plugin-getter/", env!("CARGO_PKG_VERSION"));

/// A [`Getter`] over the GitHub REST and release-download conventions.
///
/// # Examples
///
/// ```no_run
/// use plugin_getter_github::GithubGetter;
///
/// # fn main() -> plugin_getter::Result<()> {
/// let getter = GithubGetter::new()?.with_token("ghp_...".to_string());
/// # let _ = getter;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GithubGetter {
    client: reqwest::blocking::Client,
    api_base: String,
    download_base: String,
    token: Option<String>,
}

impl GithubGetter {
    /// Builds a getter against the public GitHub endpoints with the
    /// default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Builds a getter with an explicit request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| Error::Transport {
                url: DEFAULT_API_BASE.to_string(),
                status: None,
                reason: format!("failed to build http client: {err}"),
            })?;

        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            download_base: DEFAULT_DOWNLOAD_BASE.to_string(),
            token: None,
        })
    }

    /// Overrides the REST API base URL, e.g. for a GitHub Enterprise host.
    #[must_use]
    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base;
        self
    }

    /// Overrides the release-download base URL.
    #[must_use]
    pub fn with_download_base(mut self, download_base: String) -> Self {
        self.download_base = download_base;
        self
    }

    /// Authenticates requests with a bearer token, which raises the rate
    /// limit considerably.
    #[must_use]
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    /// `<namespace>/packer-plugin-<name>`, the conventional repository
    /// path for a plugin.
    fn repo_path(requirement: &Requirement) -> String {
        format!(
            "{}/packer-plugin-{}",
            requirement.identifier.namespace(),
            requirement.identifier.name()
        )
    }

    fn tags_url(&self, requirement: &Requirement) -> String {
        format!(
            "{}/repos/{}/tags?per_page=100",
            self.api_base,
            Self::repo_path(requirement)
        )
    }

    fn asset_url(&self, requirement: &Requirement, tag: &str, asset: &str) -> String {
        format!(
            "{}/{}/releases/download/{tag}/{asset}",
            self.download_base,
            Self::repo_path(requirement)
        )
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        trace!(url, "fetching");
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|err| Error::Transport {
            url: url.to_string(),
            status: None,
            reason: err.to_string(),
        })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            // GitHub reports an exhausted rate limit as 403 or 429 with
            // x-ratelimit-remaining: 0.
            let remaining = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok());
            if (status.as_u16() == 403 || status.as_u16() == 429) && remaining == Some("0") {
                let reset = response
                    .headers()
                    .get("x-ratelimit-reset")
                    .and_then(|v| v.to_str().ok())
                    .map(|epoch| format!("after epoch {epoch}"));
                return Err(Error::RateLimited { reset });
            }
            return Err(Error::Transport {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            });
        }

        let body = response.bytes().map_err(|err| Error::Transport {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: err.to_string(),
        })?;
        Ok(body.to_vec())
    }
}

impl Getter for GithubGetter {
    fn get(&self, what: GetWhat, opts: &GetOptions<'_>) -> Result<Vec<u8>> {
        match what {
            GetWhat::Releases => {
                let url = self.tags_url(opts.requirement);
                debug!(plugin = %opts.requirement.identifier, %url, "listing release tags");
                let raw = self.fetch(&url)?;
                tags_to_releases(&raw)
            }
            GetWhat::Sha256 => {
                let tag = opts.version_tag().ok_or_else(|| missing_version(what))?;
                let asset = format!(
                    "packer-plugin-{}_{tag}_SHA256SUMS",
                    opts.requirement.identifier.name()
                );
                let url = self.asset_url(opts.requirement, &tag, &asset);
                debug!(plugin = %opts.requirement.identifier, %url, "fetching checksum document");
                let raw = self.fetch(&url)?;
                sums_to_entries(&raw)
            }
            GetWhat::Zip => {
                let Some(version) = opts.version else {
                    return Err(missing_version(what));
                };
                let asset = match opts.expected_artifact {
                    Some(name) => name.to_string(),
                    // The artifact name is normally known from the checksum
                    // manifest; reconstruct the conventional one otherwise.
                    None => expected_artifact_filename(
                        opts.requirement,
                        version,
                        opts.binary_installation,
                    ),
                };
                let url = self.asset_url(opts.requirement, &format!("v{version}"), &asset);
                debug!(plugin = %opts.requirement.identifier, %url, "fetching artifact");
                self.fetch(&url)
            }
        }
    }
}

fn missing_version(what: GetWhat) -> Error {
    Error::InvalidGetRequest {
        what: what.to_string(),
        reason: "a selected version is required".to_string(),
    }
}

/// One entry of the GitHub tags payload.
#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Transforms a GitHub tags payload into the canonical releases JSON.
fn tags_to_releases(raw: &[u8]) -> Result<Vec<u8>> {
    let tags: Vec<Tag> = serde_json::from_slice(raw)?;
    let releases: Vec<Release> = tags
        .into_iter()
        .map(|tag| Release {
            version: tag
                .name
                .strip_prefix('v')
                .unwrap_or(&tag.name)
                .to_string(),
        })
        .collect();
    Ok(serde_json::to_vec(&releases)?)
}

/// Transforms a `SHA256SUMS` text document into the canonical
/// checksum-manifest JSON.
///
/// Each non-empty line must hold a digest and a filename; anything else is
/// rejected rather than guessed at.
fn sums_to_entries(raw: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(raw).map_err(|_| Error::MalformedChecksum {
        algorithm: "sha256",
        reason: "checksum document is not valid utf-8".to_string(),
    })?;

    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(checksum), Some(filename), None) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::MalformedChecksum {
                algorithm: "sha256",
                reason: format!(
                    "expected \"<digest> <filename>\" per line, got {line:?}"
                ),
            });
        };
        entries.push(ChecksumFileEntry {
            filename: filename.to_string(),
            checksum: checksum.to_string(),
        });
    }

    Ok(serde_json::to_vec(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugin_getter::{VersionConstraintSet, parse_checksum_file_entries, parse_releases};

    fn requirement() -> Requirement {
        Requirement::new(
            "github.com/hashicorp/comment".parse().unwrap(),
            VersionConstraintSet::default(),
        )
    }

    #[test]
    fn test_repo_path() {
        assert_eq!(
            GithubGetter::repo_path(&requirement()),
            "hashicorp/packer-plugin-comment"
        );
    }

    #[test]
    fn test_tags_url() {
        let getter = GithubGetter::new().unwrap();
        assert_eq!(
            getter.tags_url(&requirement()),
            "https://api.github.com/repos/hashicorp/packer-plugin-comment/tags?per_page=100"
        );
    }

    #[test]
    fn test_asset_url() {
        let getter = GithubGetter::new()
            .unwrap()
            .with_download_base("https://mirror.example.com".to_string());
        assert_eq!(
            getter.asset_url(
                &requirement(),
                "v1.2.3",
                "packer-plugin-comment_v1.2.3_SHA256SUMS"
            ),
            "https://mirror.example.com/hashicorp/packer-plugin-comment/releases/download/v1.2.3/packer-plugin-comment_v1.2.3_SHA256SUMS"
        );
    }

    #[test]
    fn test_tags_to_releases_strips_v() {
        let raw = br#"[{"name":"v1.2.3","commit":{"sha":"abc"}},{"name":"v0.1.0"}]"#;
        let canonical = tags_to_releases(raw).unwrap();

        let releases = parse_releases(&canonical).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].version, "1.2.3");
        assert_eq!(releases[1].version, "0.1.0");
    }

    #[test]
    fn test_tags_to_releases_rejects_garbage() {
        assert!(tags_to_releases(b"<html>rate limited</html>").is_err());
    }

    #[test]
    fn test_sums_to_entries() {
        let raw = b"\
6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b  packer-plugin-comment_v1.2.3_x5.0_darwin_amd64.zip
d4735e3a265e16eee03f59718b9b5d03019c07d8b6c51f90da3a666eec13ab35  packer-plugin-comment_v1.2.3_x5.0_linux_amd64.zip
";
        let canonical = sums_to_entries(raw).unwrap();

        let entries = parse_checksum_file_entries(&canonical).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].filename,
            "packer-plugin-comment_v1.2.3_x5.0_darwin_amd64.zip"
        );
        assert_eq!(
            entries[0].checksum,
            "6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b"
        );
    }

    #[test]
    fn test_sums_to_entries_skips_blank_lines() {
        let raw = b"\naaaa  file-one.zip\n\nbbbb  file-two.zip\n\n";
        let canonical = sums_to_entries(raw).unwrap();
        let entries = parse_checksum_file_entries(&canonical).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_sums_to_entries_rejects_malformed_lines() {
        assert!(sums_to_entries(b"just-one-field\n").is_err());
        assert!(sums_to_entries(b"too many fields here\n").is_err());
        assert!(sums_to_entries(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let getter = GithubGetter::new().unwrap();
        let requirement = requirement();
        let binary_installation = plugin_getter::BinaryInstallationOptions {
            os: "linux".to_string(),
            arch: "amd64".to_string(),
            api_version: plugin_getter::ApiVersion::new(5, 0),
            ext: String::new(),
            checksummers: vec![plugin_getter::Checksummer::Sha256],
        };

        let err = getter
            .get(
                GetWhat::Sha256,
                &GetOptions {
                    requirement: &requirement,
                    binary_installation: &binary_installation,
                    version: None,
                    expected_artifact: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGetRequest { .. }));
    }
}
