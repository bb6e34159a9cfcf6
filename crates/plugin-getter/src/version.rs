//! Version constraints and best-match selection.
//!
//! Constraint expressions are comma-separated comparisons over semantic
//! versions, e.g. `">=1.2.0, <2.0.0"`. A bare version (`"1.2.3"` or
//! `"v1.2.3"`) is an equality constraint, not a caret range, which is why
//! expressions are parsed here instead of with `semver::VersionReq`.

use std::fmt;
use std::str::FromStr;

pub use semver::Version;

use crate::error::{Error, Result};

/// A single comparison against a version.
#[derive(Debug, Clone, PartialEq, Eq)]
struct VersionConstraint {
    op: ConstraintOp,
    version: Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ConstraintOp {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

impl VersionConstraint {
    fn matches(&self, candidate: &Version) -> bool {
        match self.op {
            ConstraintOp::Eq => *candidate == self.version,
            ConstraintOp::Ne => *candidate != self.version,
            ConstraintOp::Gt => *candidate > self.version,
            ConstraintOp::Gte => *candidate >= self.version,
            ConstraintOp::Lt => *candidate < self.version,
            ConstraintOp::Lte => *candidate <= self.version,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// An ordered set of version constraints, all of which must hold.
///
/// The empty set matches every version and stands for "latest".
///
/// # Examples
///
/// ```
/// use plugin_getter::VersionConstraintSet;
/// use semver::Version;
///
/// let set: VersionConstraintSet = ">=1.0.0, <2.0.0".parse().unwrap();
/// assert!(set.satisfies(&Version::new(1, 5, 0)));
/// assert!(!set.satisfies(&Version::new(2, 0, 0)));
///
/// let latest = VersionConstraintSet::default();
/// assert!(latest.satisfies(&Version::new(0, 1, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionConstraintSet {
    constraints: Vec<VersionConstraint>,
}

impl VersionConstraintSet {
    /// Returns true when no constraint was given, meaning "latest".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Returns true when `candidate` satisfies every constraint.
    #[must_use]
    pub fn satisfies(&self, candidate: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(candidate))
    }
}

impl FromStr for VersionConstraintSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let mut constraints = Vec::new();
        for token in trimmed.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(Error::MalformedVersion {
                    version: s.to_string(),
                    reason: "empty constraint in expression".to_string(),
                });
            }

            let (op, rest) = if let Some(rest) = token.strip_prefix(">=") {
                (ConstraintOp::Gte, rest)
            } else if let Some(rest) = token.strip_prefix("<=") {
                (ConstraintOp::Lte, rest)
            } else if let Some(rest) = token.strip_prefix("!=") {
                (ConstraintOp::Ne, rest)
            } else if let Some(rest) = token.strip_prefix('>') {
                (ConstraintOp::Gt, rest)
            } else if let Some(rest) = token.strip_prefix('<') {
                (ConstraintOp::Lt, rest)
            } else if let Some(rest) = token.strip_prefix('=') {
                (ConstraintOp::Eq, rest)
            } else {
                (ConstraintOp::Eq, token)
            };

            let version = parse_version(rest.trim())?;
            constraints.push(VersionConstraint { op, version });
        }

        Ok(Self { constraints })
    }
}

impl fmt::Display for VersionConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, constraint) in self.constraints.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{constraint}")?;
        }
        Ok(())
    }
}

/// Parses a semantic version, accepting an optional leading `v`.
pub fn parse_version(s: &str) -> Result<Version> {
    let bare = s.strip_prefix('v').unwrap_or(s);
    Version::parse(bare).map_err(|e| Error::MalformedVersion {
        version: s.to_string(),
        reason: e.to_string(),
    })
}

/// Picks the best version among `candidates`: the semantic-version maximum
/// of those satisfying `constraints`. Numeric ordering, not lexical, so
/// `1.10.0` beats `1.9.0`. Returns `None` when nothing matches.
#[must_use]
pub fn select(candidates: &[Version], constraints: &VersionConstraintSet) -> Option<Version> {
    candidates
        .iter()
        .filter(|v| constraints.satisfies(v))
        .max()
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_range_selects_highest_match() {
        let set: VersionConstraintSet = ">=1.0.0, <2.0.0".parse().unwrap();
        let candidates = vec![v("0.9.0"), v("1.0.0"), v("1.5.0"), v("2.0.0")];

        assert_eq!(select(&candidates, &set), Some(v("1.5.0")));
    }

    #[test]
    fn test_bare_version_means_equality() {
        let set: VersionConstraintSet = "1.2.3".parse().unwrap();
        assert!(set.satisfies(&v("1.2.3")));
        assert!(!set.satisfies(&v("1.2.4")));

        // Not a caret range: 1.9.0 would satisfy "^1.2.3".
        assert!(!set.satisfies(&v("1.9.0")));
    }

    #[test]
    fn test_v_prefixed_version_means_equality() {
        let set: VersionConstraintSet = "v0.2.18".parse().unwrap();
        assert!(set.satisfies(&v("0.2.18")));
        assert!(!set.satisfies(&v("0.2.19")));
    }

    #[test]
    fn test_empty_set_matches_everything() {
        let set: VersionConstraintSet = "".parse().unwrap();
        assert!(set.is_empty());
        assert!(set.satisfies(&v("0.0.1")));
        assert!(set.satisfies(&v("99.0.0")));
    }

    #[test]
    fn test_not_equal_excludes() {
        let set: VersionConstraintSet = ">=1.0.0, !=1.1.0".parse().unwrap();
        assert!(set.satisfies(&v("1.0.0")));
        assert!(!set.satisfies(&v("1.1.0")));
        assert!(set.satisfies(&v("1.2.0")));
    }

    #[test]
    fn test_numeric_ordering_not_lexical() {
        let set = VersionConstraintSet::default();
        let candidates = vec![v("1.9.0"), v("1.10.0")];
        assert_eq!(select(&candidates, &set), Some(v("1.10.0")));
    }

    #[test]
    fn test_select_empty_candidates() {
        assert_eq!(select(&[], &VersionConstraintSet::default()), None);
    }

    #[test]
    fn test_select_no_match() {
        let set: VersionConstraintSet = ">=2.0.0".parse().unwrap();
        let candidates = vec![v("1.0.0"), v("1.5.0")];
        assert_eq!(select(&candidates, &set), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("one-dot-two".parse::<VersionConstraintSet>().is_err());
        assert!(">=1.0.0,,<2.0.0".parse::<VersionConstraintSet>().is_err());
        assert!(">= banana".parse::<VersionConstraintSet>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let set: VersionConstraintSet = ">=1.2.0, <2.0.0".parse().unwrap();
        assert_eq!(set.to_string(), ">=1.2.0, <2.0.0");

        let reparsed: VersionConstraintSet = set.to_string().parse().unwrap();
        assert_eq!(set, reparsed);
    }

    #[test]
    fn test_parse_version_strips_v() {
        assert_eq!(parse_version("v1.2.3").unwrap(), v("1.2.3"));
        assert_eq!(parse_version("1.2.3").unwrap(), v("1.2.3"));
        assert!(parse_version("v1.2").is_err());
    }
}
