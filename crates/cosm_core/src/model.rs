//! Entities of spec §3, serialized as pretty-printed two-space JSON per §6.
//! Maps are keyed by the textual `"<uuid>@v<major>"` bucket (§9: an
//! implementer may use a typed `(Uuid, u32)` key internally, but here the
//! textual form doubles as both the in-memory and the on-disk key, which
//! keeps (de)serialization a no-op).

use std::collections::BTreeMap;

use cosm_semver::SemVer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// The `"<uuid>@v<major>"` bucket key for a package at a given major
/// version. At most one dependency on a given package's given major can
/// coexist in any one `deps`/build-list map.
pub fn bucket_key(uuid: Uuid, major: u32) -> String {
    format!("{uuid}@v{major}")
}

/// Splits a bucket key back into its UUID and major components.
pub fn split_bucket_key(key: &str) -> Result<(Uuid, u32)> {
    let (uuid_part, major_part) = key
        .split_once('@')
        .ok_or_else(|| Error::Malformed(format!("not a bucket key: `{key}`")))?;
    let uuid = Uuid::parse_str(uuid_part)?;
    let major_text = major_part
        .strip_prefix('v')
        .ok_or_else(|| Error::Malformed(format!("not a bucket key: `{key}`")))?;
    let major: u32 = major_text
        .parse()
        .map_err(|_| Error::Malformed(format!("not a bucket key: `{key}`")))?;
    Ok((uuid, major))
}

/// One entry of `Project.deps`: a direct dependency on a package's major
/// bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepEntry {
    pub name: String,
    pub version: SemVer,
    pub develop: bool,
}

/// A project's manifest, stored as `Project.json` at the working-tree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub uuid: Uuid,
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub version: SemVer,
    #[serde(default)]
    pub deps: BTreeMap<String, DepEntry>,
}

impl Project {
    /// Inserts a dependency at its `"<uuid>@v<major>"` bucket, failing if
    /// that bucket is already occupied (spec S3: major coexistence
    /// refused).
    pub fn insert_dep(&mut self, uuid: Uuid, name: String, version: SemVer, develop: bool) -> Result<()> {
        let key = bucket_key(uuid, version.major);
        if self.deps.contains_key(&key) {
            return Err(Error::AlreadyExists(format!(
                "dependency bucket `{key}` is already occupied"
            )));
        }
        self.deps.insert(key, DepEntry { name, version, develop });
        Ok(())
    }

    /// All bucket keys whose entry's `name` matches, for `rm-dep`
    /// disambiguation.
    pub fn deps_named<'a>(&'a self, name: &str) -> Vec<(&'a str, &'a DepEntry)> {
        self.deps
            .iter()
            .filter(|(_, dep)| dep.name == name)
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

/// A package's registration within one registry: its identity and source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub uuid: Uuid,
    pub giturl: String,
}

/// A registry's own manifest, stored as `registry.json` at the registry's
/// Git repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub name: String,
    pub uuid: Uuid,
    pub giturl: String,
    #[serde(default)]
    pub packages: BTreeMap<String, PackageInfo>,
}

impl Registry {
    pub fn new(name: String, uuid: Uuid, giturl: String) -> Self {
        Self {
            name,
            uuid,
            giturl,
            packages: BTreeMap::new(),
        }
    }
}

/// The per-version, per-package metadata record binding name/uuid/version
/// to a commit SHA-1 and its direct dependency map. Immutable once written
/// for a given `(package, version)` (spec S5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specs {
    pub name: String,
    pub uuid: Uuid,
    pub version: SemVer,
    pub giturl: String,
    pub sha1: String,
    #[serde(default)]
    pub deps: BTreeMap<String, DepEntry>,
}

/// One resolved entry of a [`BuildList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEntry {
    pub name: String,
    pub uuid: Uuid,
    pub version: SemVer,
    pub giturl: String,
    pub sha1: String,
}

impl BuildEntry {
    pub fn from_specs(specs: &Specs) -> Self {
        Self {
            name: specs.name.clone(),
            uuid: specs.uuid,
            version: specs.version,
            giturl: specs.giturl.clone(),
            sha1: specs.sha1.clone(),
        }
    }
}

/// The full set of `(pkg, version)` pairs selected by MVS, one per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildList(pub BTreeMap<String, BuildEntry>);

impl BuildList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&BuildEntry> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BuildEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges `entry` under `key`. On collision, the entry with the
    /// strictly greater SemVer wins; ties keep the incumbent. This makes
    /// the merge associative and commutative, so callers may fold build
    /// lists together in any order and get the same result (spec §4.8).
    pub fn merge(&mut self, key: String, entry: BuildEntry) {
        match self.0.get(&key) {
            Some(incumbent) if entry.version > incumbent.version => {
                self.0.insert(key, entry);
            }
            Some(_) => {}
            None => {
                self.0.insert(key, entry);
            }
        }
    }

    /// Folds `other` into `self`, entry by entry, using [`Self::merge`].
    pub fn merge_all(&mut self, other: &BuildList) {
        for (key, entry) in &other.0 {
            self.merge(key.clone(), entry.clone());
        }
    }
}

/// The result of resolving a requested `(name, version)` to a particular
/// registry. Ephemeral: never serialized to disk.
#[derive(Debug, Clone)]
pub struct PackageLocation {
    pub registry_name: String,
    pub specs: Specs,
}
