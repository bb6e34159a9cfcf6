//! Plugin source addresses.
//!
//! A plugin is addressed by a source string of the form
//! `host/namespace/name`, e.g. `github.com/hashicorp/happycloud`. The
//! address is independent of any version and maps directly onto the
//! directory hierarchy plugins are installed under.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

const EXAMPLE_SOURCE: &str = "github.com/hashicorp/happycloud";

/// Canonical plugin address: host, namespace, and plugin name.
///
/// Host and namespace compare case-insensitively; the name compares
/// exactly. Two identifiers that compare equal install to the same
/// directory.
///
/// # Examples
///
/// ```
/// use plugin_getter::PluginIdentifier;
///
/// let id: PluginIdentifier = "github.com/hashicorp/comment".parse().unwrap();
/// assert_eq!(id.host(), "github.com");
/// assert_eq!(id.namespace(), "hashicorp");
/// assert_eq!(id.name(), "comment");
/// ```
#[derive(Debug, Clone, Eq)]
pub struct PluginIdentifier {
    host: String,
    namespace: String,
    name: String,
}

impl PluginIdentifier {
    /// Host part of the address, e.g. `github.com`.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Namespace part of the address, e.g. `hashicorp`.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Raw plugin name, e.g. `comment`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address components in installation-hierarchy order.
    #[must_use]
    pub fn parts(&self) -> [&str; 3] {
        [&self.host, &self.namespace, &self.name]
    }

    /// Directory this plugin installs under, below `root`.
    #[must_use]
    pub fn install_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.host).join(&self.namespace).join(&self.name)
    }
}

impl fmt::Display for PluginIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.namespace, self.name)
    }
}

impl PartialEq for PluginIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.host.eq_ignore_ascii_case(&other.host)
            && self.namespace.eq_ignore_ascii_case(&other.namespace)
            && self.name == other.name
    }
}

impl Hash for PluginIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.to_ascii_lowercase().hash(state);
        self.namespace.to_ascii_lowercase().hash(state);
        self.name.hash(state);
    }
}

impl FromStr for PluginIdentifier {
    type Err = Error;

    /// Parses a `host/namespace/name` source string.
    ///
    /// The string must not carry a URL scheme, query, or fragment, and must
    /// split into exactly three non-empty components. The name label may
    /// contain only lowercase letters, digits, and single dashes, with no
    /// leading or trailing dash.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedAddress {
            address: s.to_string(),
            reason,
        };

        if s.starts_with('/') {
            return Err(malformed(format!(
                "a source address must not start with a '/', a valid source looks like \"{EXAMPLE_SOURCE}\""
            )));
        }
        if s.ends_with('/') {
            return Err(malformed(format!(
                "a source address must not end with a '/', a valid source looks like \"{EXAMPLE_SOURCE}\""
            )));
        }
        if s.contains("://") {
            return Err(malformed(
                "a source address must not contain a scheme (e.g. https://)".to_string(),
            ));
        }
        if s.contains('?') {
            return Err(malformed(
                "a source address must not contain a query (e.g. ?var=val)".to_string(),
            ));
        }
        if s.contains('#') {
            return Err(malformed(
                "a source address must not contain a fragment (e.g. #anchor)".to_string(),
            ));
        }

        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 3 {
            return Err(malformed(format!(
                "a source address is made of a host, a namespace and a name, a valid source looks like \"{EXAMPLE_SOURCE}\""
            )));
        }
        let [host, namespace, name] = [parts[0], parts[1], parts[2]];
        if host.is_empty() || namespace.is_empty() || name.is_empty() {
            return Err(malformed(
                "a source address must not contain empty components".to_string(),
            ));
        }

        // Plugin repositories are conventionally named with the
        // `packer-plugin-` prefix, which makes it a common mistake to carry
        // the prefix into the source address. Reject it with a suggestion.
        if let Some(suggested) = name.strip_prefix("packer-plugin-") {
            if parse_plugin_part(suggested).is_ok() {
                return Err(malformed(format!(
                    "the name must not carry the \"packer-plugin-\" prefix, did you mean {suggested:?}?"
                )));
            }
        }
        if let Some(suggested) = name.strip_prefix("packer-") {
            return Err(malformed(format!(
                "the name must not carry the redundant \"packer-\" prefix, try {suggested:?}"
            )));
        }

        parse_plugin_part(name).map_err(|reason| malformed(format!("invalid name {name:?}: {reason}")))?;

        Ok(Self {
            host: host.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

/// Validates one label of a plugin address the way DNS labels are
/// validated: lowercase letters, digits, and dashes only, with no dots,
/// no leading or trailing dash, and no consecutive dashes.
fn parse_plugin_part(given: &str) -> std::result::Result<(), String> {
    if given.is_empty() {
        return Err("must have at least one character".to_string());
    }
    if given.contains('.') {
        return Err("dots are not allowed".to_string());
    }
    if given.contains("--") {
        return Err("cannot use multiple consecutive dashes".to_string());
    }
    if given.starts_with('-') || given.ends_with('-') {
        return Err("may not use leading or trailing dashes".to_string());
    }
    if !given
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("must contain only lowercase letters, digits, and dashes".to_string());
    }
    Ok(())
}
