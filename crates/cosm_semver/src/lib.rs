//! Semantic-version algebra used by every resolution decision in cosm.
//!
//! Versions are written `v<major>.<minor>[.<patch>]`; a missing patch
//! defaults to `0`. Ordering is lexicographic on `(major, minor, patch)`.
//! There is no notion of pre-release or build metadata: this is
//! intentionally a smaller algebra than the `semver` crate's, matched to
//! the text convention cosm registries and projects use on disk.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A parsed `v<major>.<minor>[.<patch>]` version.
///
/// `Ord`/`PartialOrd` are derived field-by-field, which is exactly the
/// lexicographic `(major, minor, patch)` order the spec requires because
/// the fields are declared in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// The version text did not match `v<major>.<minor>[.<patch>]`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid semantic version `{0}`")]
pub struct ParseError(pub String);

impl SemVer {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let body = text.strip_prefix('v').ok_or_else(|| ParseError(text.to_owned()))?;
        let mut parts = body.split('.');
        let major = parts
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| ParseError(text.to_owned()))?;
        let minor = parts
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| ParseError(text.to_owned()))?;
        let patch = match parts.next() {
            Some(s) => s.parse::<u32>().map_err(|_| ParseError(text.to_owned()))?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(ParseError(text.to_owned()));
        }
        Ok(Self::new(major, minor, patch))
    }

    /// The `"v<major>"` bucket key this version belongs to.
    pub fn major_key(&self) -> String {
        format!("v{}", self.major)
    }

    /// Pairwise ordering, spelled out for readability at call sites that
    /// compare versions as a primary operation rather than as `Ord::cmp`.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    /// The greater of the two versions; ties return `self`.
    pub fn max(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    /// Increment helpers used by `release --patch|--minor|--major`.
    pub fn bump_patch(self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }

    pub fn bump_minor(self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    pub fn bump_major(self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SemVer {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SemVer> for String {
    fn from(value: SemVer) -> Self {
        value.to_string()
    }
}

/// Extract the major-version bucket text (`"v<major>"`) from a version
/// string without fully parsing it, for call sites that only need the key.
pub fn major_of(version: &str) -> Result<String, ParseError> {
    SemVer::parse(version).map(|v| v.major_key())
}

/// The greater of the two versions; ties return `a`. Free-function form of
/// [`SemVer::max`] for call sites folding over an iterator.
pub fn max(a: SemVer, b: SemVer) -> SemVer {
    a.max(b)
}
