use camino::{Utf8Path, Utf8PathBuf};
use cosm_core::{Error, Result};
use cosm_depot::Depot;
use cosm_git::Repo;
use cosm_semver::SemVer;
use tracing::warn;

/// Checks out `specs.sha1` in the package's cached clone, copies the tree
/// (excluding `.git` and `.gitignore`) into the content-addressed package
/// directory, and always restores the clone to its prior checkout (§4.7).
/// Idempotent: a destination that already exists is returned unchanged,
/// since it is addressed by the immutable commit SHA-1.
pub fn make_available(depot: &Depot, registry_name: &str, name: &str, version: SemVer) -> Result<Utf8PathBuf> {
    let registry = cosm_fs::load_registry(&depot.registry_file(registry_name))?;
    let package = registry
        .packages
        .get(name)
        .ok_or_else(|| Error::NotFound(format!("package `{name}` is not in registry `{registry_name}`")))?;

    let specs_path = cosm_fs::paths::specs_file(depot.root(), registry_name, name, &version.to_string());
    let specs = cosm_fs::load_specs(&specs_path)?;

    let dest = depot.package_content_dir(name, &specs.sha1);
    if dest.exists() {
        return Ok(dest);
    }

    let clone_dir = depot.clone_dir(&package.uuid);
    if !clone_dir.exists() {
        return Err(Error::NotFound(format!(
            "no cached clone for package `{name}` (uuid {}); run `registry add` first",
            package.uuid
        )));
    }

    let repo = Repo::new(clone_dir.clone());
    repo.checkout(&specs.sha1)?;
    let copy_result = copy_tree(&clone_dir, &dest);
    if let Err(e) = repo.checkout_back() {
        warn!("checkout_back failed after materializing {name}@{version}: {e}");
    }
    copy_result?;
    Ok(dest)
}

/// Copies `src` into `dest`, skipping `.git` and `.gitignore`.
fn copy_tree(src: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(src) {
        let entry = entry.map_err(|e| Error::Io(std::io::Error::other(e)))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields entries under its own root");
        if relative.as_os_str().is_empty() {
            continue;
        }
        let relative = Utf8Path::from_path(relative)
            .ok_or_else(|| Error::Malformed(format!("{}: non-UTF-8 path", entry.path().display())))?;
        if relative
            .components()
            .next()
            .is_some_and(|c| c.as_str() == ".git")
            || relative.as_str() == ".gitignore"
        {
            continue;
        }

        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs_err::create_dir_all(&target).map_err(Error::from)?;
        } else {
            if let Some(parent) = target.parent() {
                fs_err::create_dir_all(parent).map_err(Error::from)?;
            }
            fs_err::copy(entry.path(), &target).map_err(Error::from)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RegistryEngine;
    use cosm_core::Project;
    use cosm_test_support::{TestDepot, TestRepo};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn published_package(depot: &TestDepot) -> (String, &'static str) {
        let remote = TestRepo::init_bare_remote();
        let engine = RegistryEngine::new(&depot.depot);
        engine.init("main", &remote.url()).unwrap();

        let source = TestRepo::init();
        let project = Project {
            name: "left-pad".into(),
            uuid: Uuid::new_v4(),
            authors: vec!["[test]test@cosm.local".into()],
            language: None,
            version: SemVer::new(0, 1, 0),
            deps: BTreeMap::new(),
        };
        source.write_project(&project);
        source.repo.add(&["."]).unwrap();
        source.repo.commit("add Project.json").unwrap();
        source.repo.tag("v1.0.0").unwrap();

        engine.add_new_package("main", &source.url()).unwrap();
        ("main".to_owned(), "left-pad")
    }

    #[test]
    fn make_available_materializes_the_tagged_tree() {
        let depot = TestDepot::new();
        let (registry_name, name) = published_package(&depot);

        let dest = make_available(&depot.depot, &registry_name, name, SemVer::new(1, 0, 0)).unwrap();
        assert!(dest.join("Project.json").exists());

        let clone_dir = {
            let registry = cosm_fs::load_registry(&depot.depot.registry_file(&registry_name)).unwrap();
            depot.depot.clone_dir(&registry.packages[name].uuid)
        };
        let repo = Repo::new(clone_dir);
        // checkout_back must leave the clone on a named branch, not detached
        // at the materialized tag's commit.
        assert_ne!(repo.current_branch().unwrap(), "HEAD");
    }

    #[test]
    fn make_available_is_idempotent() {
        let depot = TestDepot::new();
        let (registry_name, name) = published_package(&depot);

        let first = make_available(&depot.depot, &registry_name, name, SemVer::new(1, 0, 0)).unwrap();
        fs_err::write(first.join("marker.txt"), b"untouched by a second call").unwrap();
        let second = make_available(&depot.depot, &registry_name, name, SemVer::new(1, 0, 0)).unwrap();

        assert_eq!(first, second);
        assert!(second.join("marker.txt").exists());
    }

    #[test]
    fn make_available_without_a_cached_clone_is_not_found() {
        let depot = TestDepot::new();
        let remote = TestRepo::init_bare_remote();
        let engine = RegistryEngine::new(&depot.depot);
        engine.init("main", &remote.url()).unwrap();

        let err = make_available(&depot.depot, "main", "ghost", SemVer::new(1, 0, 0)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
