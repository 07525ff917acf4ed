//! Typed JSON read/write. Every value round-trips as pretty-printed,
//! two-space-indented, UTF-8 JSON (spec §6), which keeps registry diffs in
//! version control readable.

use camino::Utf8Path;
use cosm_core::{BuildList, Error, Project, Registry, Result, Specs};
use cosm_semver::SemVer;
use serde::{de::DeserializeOwned, Serialize};

/// Loads and deserializes `path`. A missing file is [`Error::NotFound`]; a
/// file that exists but does not parse is [`Error::Malformed`].
pub fn load<T: DeserializeOwned>(path: &Utf8Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::NotFound(format!("{path} does not exist")));
    }
    let text = fs_err::read_to_string(path).map_err(|e| Error::Io(e.into()))?;
    serde_json::from_str(&text).map_err(|e| Error::Malformed(format!("{path}: {e}")))
}

/// Serializes `value` as pretty two-space JSON and writes it to `path`,
/// creating parent directories as needed.
pub fn save<T: Serialize>(path: &Utf8Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent).map_err(|e| Error::Io(e.into()))?;
    }
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(
        &mut buf,
        serde_json::ser::PrettyFormatter::with_indent(b"  "),
    );
    value
        .serialize(&mut serializer)
        .map_err(|e| Error::Malformed(e.to_string()))?;
    buf.push(b'\n');
    fs_err::write(path, buf).map_err(|e| Error::Io(e.into()))
}

pub fn load_project(path: &Utf8Path) -> Result<Project> {
    load(path)
}

pub fn save_project(path: &Utf8Path, project: &Project) -> Result<()> {
    save(path, project)
}

pub fn load_registry(path: &Utf8Path) -> Result<Registry> {
    load(path)
}

pub fn save_registry(path: &Utf8Path, registry: &Registry) -> Result<()> {
    save(path, registry)
}

pub fn load_specs(path: &Utf8Path) -> Result<Specs> {
    load(path)
}

pub fn save_specs(path: &Utf8Path, specs: &Specs) -> Result<()> {
    save(path, specs)
}

pub fn load_build_list(path: &Utf8Path) -> Result<BuildList> {
    load(path)
}

pub fn save_build_list(path: &Utf8Path, build_list: &BuildList) -> Result<()> {
    save(path, build_list)
}

pub fn load_registry_names(path: &Utf8Path) -> Result<Vec<String>> {
    load(path)
}

pub fn save_registry_names(path: &Utf8Path, names: &[String]) -> Result<()> {
    save(path, &names)
}

pub fn load_versions(path: &Utf8Path) -> Result<Vec<SemVer>> {
    load(path)
}

pub fn save_versions(path: &Utf8Path, versions: &[SemVer]) -> Result<()> {
    save(path, &versions)
}
