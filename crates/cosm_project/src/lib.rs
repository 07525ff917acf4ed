//! Project lifecycle (§4.6): `init`, `add-dep`, `rm-dep`, `release`.

mod release;

pub use release::ReleaseSelector;

use camino::Utf8Path;
use cosm_core::{DepEntry, Error, PackageLocation, Project, Result};
use cosm_depot::Depot;
use cosm_registry::RegistryEngine;
use cosm_semver::SemVer;
use uuid::Uuid;

/// `add-dep`'s result when more than one registry carries the requested
/// package: the engine never guesses, it hands the choice back (§4.6).
pub enum AddDepOutcome {
    Added { name: String, version: SemVer },
    Ambiguous(Vec<PackageLocation>),
}

/// `rm-dep`'s result when more than one entry matches by name (§4.6).
pub enum RmDepOutcome {
    Removed { bucket_key: String },
    Ambiguous(Vec<(String, DepEntry)>),
}

/// Creates `Project.json` at `workdir`. Refuses an existing one.
pub fn init(workdir: &Utf8Path, name: &str, version: Option<SemVer>, language: Option<String>) -> Result<()> {
    let path = cosm_fs::paths::project_file(workdir);
    if path.exists() {
        return Err(Error::AlreadyExists(format!("{path} already exists")));
    }

    let project = Project {
        name: name.to_owned(),
        uuid: Uuid::new_v4(),
        authors: vec![default_author()],
        language,
        version: version.unwrap_or(SemVer::new(0, 1, 0)),
        deps: Default::default(),
    };
    cosm_fs::save_project(&path, &project)
}

/// `[name]email` from the user's global Git identity, falling back to a
/// placeholder when neither is configured.
fn default_author() -> String {
    let name = cosm_git::config_global("user.name").unwrap_or_else(|_| "unknown".to_owned());
    let email = cosm_git::config_global("user.email").unwrap_or_else(|_| "unknown@author.com".to_owned());
    format!("[{name}]{email}")
}

/// Resolves `(name, version)` via the registry engine and, unless
/// ambiguous, inserts it into `Project.deps` at its major-version bucket.
/// Refuses an already-occupied bucket (spec S3).
pub fn add_dep(
    workdir: &Utf8Path,
    depot: &Depot,
    registries: &[String],
    name: &str,
    version: Option<SemVer>,
) -> Result<AddDepOutcome> {
    let path = cosm_fs::paths::project_file(workdir);
    let mut project = cosm_fs::load_project(&path)?;

    let engine = RegistryEngine::new(depot);
    let mut locations = engine.find(name, version, registries)?;
    if locations.len() > 1 {
        return Ok(AddDepOutcome::Ambiguous(locations));
    }
    let location = locations.remove(0);

    project.insert_dep(location.specs.uuid, location.specs.name.clone(), location.specs.version, false)?;
    cosm_fs::save_project(&path, &project)?;
    Ok(AddDepOutcome::Added {
        name: location.specs.name,
        version: location.specs.version,
    })
}

/// Removes every `Project.deps` entry whose `name` matches. Exactly one
/// match removes it; more than one is returned for the caller to pick.
pub fn rm_dep(workdir: &Utf8Path, name: &str) -> Result<RmDepOutcome> {
    let path = cosm_fs::paths::project_file(workdir);
    let mut project = cosm_fs::load_project(&path)?;

    let matches: Vec<String> = project.deps_named(name).into_iter().map(|(k, _)| k.to_owned()).collect();
    match matches.as_slice() {
        [] => Err(Error::NotFound(format!("no dependency named `{name}`"))),
        [only] => {
            project.deps.remove(only);
            cosm_fs::save_project(&path, &project)?;
            Ok(RmDepOutcome::Removed { bucket_key: only.clone() })
        }
        _ => {
            let candidates = matches
                .into_iter()
                .map(|key| {
                    let entry = project.deps[&key].clone();
                    (key, entry)
                })
                .collect();
            Ok(RmDepOutcome::Ambiguous(candidates))
        }
    }
}

/// Removes a specific ambiguous `rm-dep` candidate by its bucket key, once
/// the caller has chosen one from [`RmDepOutcome::Ambiguous`].
pub fn rm_dep_by_bucket(workdir: &Utf8Path, key: &str) -> Result<()> {
    let path = cosm_fs::paths::project_file(workdir);
    let mut project = cosm_fs::load_project(&path)?;
    if project.deps.remove(key).is_none() {
        return Err(Error::NotFound(format!("no dependency bucket `{key}`")));
    }
    cosm_fs::save_project(&path, &project)
}

pub use release::release;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn workdir_with(project: &Project) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap();
        cosm_fs::save_project(&cosm_fs::paths::project_file(path), project).unwrap();
        dir
    }

    fn base_project() -> Project {
        Project {
            name: "app".into(),
            uuid: Uuid::new_v4(),
            authors: vec![],
            language: None,
            version: SemVer::new(0, 1, 0),
            deps: BTreeMap::new(),
        }
    }

    #[test]
    fn rm_dep_removes_the_sole_match() {
        let mut project = base_project();
        let dep_uuid = Uuid::new_v4();
        project
            .insert_dep(dep_uuid, "left-pad".into(), SemVer::new(1, 0, 0), false)
            .unwrap();
        let dir = workdir_with(&project);
        let workdir = Utf8Path::from_path(dir.path()).unwrap();

        match rm_dep(workdir, "left-pad").unwrap() {
            RmDepOutcome::Removed { bucket_key } => {
                assert_eq!(bucket_key, cosm_core::bucket_key(dep_uuid, 1));
            }
            RmDepOutcome::Ambiguous(_) => panic!("expected a single match"),
        }
        assert!(cosm_fs::load_project(&cosm_fs::paths::project_file(workdir)).unwrap().deps.is_empty());
    }

    #[test]
    fn rm_dep_reports_ambiguity_across_major_buckets() {
        let mut project = base_project();
        let dep_uuid = Uuid::new_v4();
        project
            .insert_dep(dep_uuid, "left-pad".into(), SemVer::new(1, 0, 0), false)
            .unwrap();
        project
            .insert_dep(dep_uuid, "left-pad".into(), SemVer::new(2, 0, 0), false)
            .unwrap();
        let dir = workdir_with(&project);
        let workdir = Utf8Path::from_path(dir.path()).unwrap();

        let candidates = match rm_dep(workdir, "left-pad").unwrap() {
            RmDepOutcome::Ambiguous(candidates) => candidates,
            RmDepOutcome::Removed { .. } => panic!("expected ambiguity across two buckets"),
        };
        assert_eq!(candidates.len(), 2);

        // The caller resolves the ambiguity by bucket key.
        let (key, _) = &candidates[0];
        rm_dep_by_bucket(workdir, key).unwrap();
        let remaining = cosm_fs::load_project(&cosm_fs::paths::project_file(workdir)).unwrap();
        assert_eq!(remaining.deps.len(), 1);
        assert!(!remaining.deps.contains_key(key));
    }

    #[test]
    fn rm_dep_by_bucket_on_an_unknown_key_is_not_found() {
        let dir = workdir_with(&base_project());
        let workdir = Utf8Path::from_path(dir.path()).unwrap();

        let err = rm_dep_by_bucket(workdir, &cosm_core::bucket_key(Uuid::new_v4(), 1)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
