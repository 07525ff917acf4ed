use std::collections::BTreeMap;

use camino::Utf8Path;
use cosm_core::{BuildList, DepEntry, Error, PackageInfo, PackageLocation, Registry, Result, Specs};
use cosm_depot::Depot;
use cosm_git::Repo;
use cosm_semver::SemVer;
use tracing::{info, warn};
use uuid::{Uuid, Version};

use crate::tmp_clone::TmpCloneGuard;

/// Registry-level and package-level operations against one depot (§4.5).
pub struct RegistryEngine<'a> {
    depot: &'a Depot,
}

impl<'a> RegistryEngine<'a> {
    pub fn new(depot: &'a Depot) -> Self {
        Self { depot }
    }

    /// Clones `url` into `registries/<name>/`, refusing a remote that
    /// already carries content beyond `.git`, then writes a fresh
    /// `registry.json` and registers the name.
    pub fn init(&self, name: &str, url: &str) -> Result<()> {
        if self.depot.registry_names()?.iter().any(|n| n == name) {
            return Err(Error::AlreadyExists(format!("registry `{name}` is already registered")));
        }

        let dest = self.depot.registry_dir(name);
        cosm_git::clone(url, &dest)?;
        if has_entries_besides_git(&dest)? {
            let _ = fs_err::remove_dir_all(&dest);
            return Err(Error::RepoState(format!(
                "{url} is not empty; refusing to initialize a fresh registry there"
            )));
        }

        let registry = Registry::new(name.to_owned(), Uuid::new_v4(), url.to_owned());
        cosm_fs::save_registry(&self.depot.registry_file(name), &registry)?;

        let mut names = self.depot.registry_names()?;
        names.push(name.to_owned());
        self.depot.save_registry_names(&names)?;

        let repo = Repo::new(dest);
        repo.add(&["."])?;
        repo.commit(&format!("Initialized registry {name}"))?;
        let branch = repo.current_branch()?;
        repo.push(&branch, true)?;
        Ok(())
    }

    /// Clones `url` to learn the registry's name, then moves it into place.
    /// Fails rather than overwriting a registry already known by that name
    /// (§9: the CLI layer may opt into overwrite by `delete` then `clone`).
    pub fn clone(&self, url: &str) -> Result<String> {
        let tmp = self.depot.tmp_clone_dir();
        let guard = TmpCloneGuard::new(tmp.clone());
        cosm_git::clone(url, guard.path())?;

        let registry = cosm_fs::load_registry(&tmp.join(cosm_fs::paths::REGISTRY_FILE))?;
        let name = registry.name.clone();
        let dest = self.depot.registry_dir(&name);
        if dest.exists() || self.depot.registry_names()?.iter().any(|n| n == &name) {
            return Err(Error::AlreadyExists(format!("registry `{name}` is already registered")));
        }

        fs_err::rename(guard.path(), &dest).map_err(Error::from)?;
        let mut names = self.depot.registry_names()?;
        names.push(name.clone());
        self.depot.save_registry_names(&names)?;
        Ok(name)
    }

    /// Pulls the current branch of one registry's working copy.
    pub fn update_one(&self, name: &str) -> Result<()> {
        let dir = self.depot.registry_dir(name);
        if !dir.exists() {
            return Err(Error::NotFound(format!("registry `{name}` is not registered")));
        }
        let repo = Repo::new(dir);
        let branch = repo.current_branch()?;
        repo.pull(&branch)?;
        Ok(())
    }

    /// Updates every registered registry. A failure on one does not abort
    /// the rest (§4.5, §9): each outcome is reported back to the caller.
    pub fn update_all(&self) -> Result<Vec<(String, Result<()>)>> {
        let names = self.depot.registry_names()?;
        Ok(names
            .into_iter()
            .map(|name| {
                let outcome = self.update_one(&name);
                if let Err(e) = &outcome {
                    warn!("update of registry `{name}` failed: {e}");
                }
                (name, outcome)
            })
            .collect())
    }

    /// Removes a registry's local working copy and its entry in
    /// `registries.json`. Never touches the remote.
    pub fn delete(&self, name: &str) -> Result<()> {
        let dir = self.depot.registry_dir(name);
        let mut names = self.depot.registry_names()?;
        if !dir.exists() && !names.iter().any(|n| n == name) {
            return Err(Error::NotFound(format!("registry `{name}` is not registered")));
        }
        if dir.exists() {
            fs_err::remove_dir_all(&dir).map_err(Error::from)?;
        }
        names.retain(|n| n != name);
        self.depot.save_registry_names(&names)?;
        Ok(())
    }

    /// Add-new-package form of `add` (§4.5): clones `package_url`, reads
    /// its `Project.json` at HEAD for identity, then processes every
    /// releasable tag before committing and pushing the registry once.
    pub fn add_new_package(&self, registry_name: &str, package_url: &str) -> Result<()> {
        self.update_one(registry_name)?;

        let tmp = self.depot.tmp_clone_dir();
        let guard = TmpCloneGuard::new(tmp.clone());
        cosm_git::clone(package_url, guard.path())?;
        let repo = Repo::new(tmp.clone());
        repo.fetch_tags()?;

        let project = cosm_fs::load_project(&cosm_fs::paths::project_file(&tmp))?;
        if !is_v4_uuid(project.uuid) {
            return Err(Error::Malformed(format!(
                "{package_url}: Project.json uuid {} is not a v4 identifier",
                project.uuid
            )));
        }

        let mut registry = cosm_fs::load_registry(&self.depot.registry_file(registry_name))?;
        if registry.packages.contains_key(&project.name) {
            return Err(Error::AlreadyExists(format!(
                "package `{}` already exists in registry `{registry_name}`",
                project.name
            )));
        }

        let mut tags: Vec<SemVer> = repo
            .list_tags()?
            .iter()
            .filter_map(|t| SemVer::parse(t).ok())
            .collect();
        tags.sort();

        for version in &tags {
            self.process_tag(registry_name, &project.name, project.uuid, package_url, *version, &repo)?;
        }

        registry.packages.insert(
            project.name.clone(),
            PackageInfo {
                uuid: project.uuid,
                giturl: package_url.to_owned(),
            },
        );
        cosm_fs::save_registry(&self.depot.registry_file(registry_name), &registry)?;

        let clone_dest = self.depot.clone_dir(&project.uuid);
        if clone_dest.exists() {
            warn!("replacing existing cached clone at {clone_dest}");
            fs_err::remove_dir_all(&clone_dest).map_err(Error::from)?;
        }
        fs_err::rename(guard.path(), &clone_dest).map_err(Error::from)?;

        let message = match tags.first() {
            Some(first) => format!("Added package {} version {first}", project.name),
            None => format!("Added package {}", project.name),
        };
        self.commit_and_push_registry(registry_name, &message)
    }

    /// Add-version form of `add` (§4.5): the package must already exist;
    /// the version must not already be listed.
    pub fn add_version(&self, registry_name: &str, package_name: &str, version: SemVer) -> Result<()> {
        self.update_one(registry_name)?;

        let registry = cosm_fs::load_registry(&self.depot.registry_file(registry_name))?;
        let package = registry
            .packages
            .get(package_name)
            .ok_or_else(|| Error::NotFound(format!("package `{package_name}` is not in registry `{registry_name}`")))?
            .clone();

        let versions = load_versions_or_empty(self.depot.root(), registry_name, package_name)?;
        if versions.contains(&version) {
            return Err(Error::AlreadyExists(format!("{package_name}@{version} is already published")));
        }

        let clone_dir = self.depot.clone_dir(&package.uuid);
        if !clone_dir.exists() {
            let tmp = self.depot.tmp_clone_dir();
            let guard = TmpCloneGuard::new(tmp.clone());
            cosm_git::clone(&package.giturl, guard.path())?;
            fs_err::rename(guard.path(), &clone_dir).map_err(Error::from)?;
        }
        let repo = Repo::new(clone_dir);

        self.process_tag(registry_name, package_name, package.uuid, &package.giturl, version, &repo)?;

        let message = format!("Added version {version} of package {package_name}");
        self.commit_and_push_registry(registry_name, &message)
    }

    /// Removes a single version, or the whole package when `version` is
    /// `None`. Confirmation for destructive removal is a CLI concern, not
    /// the engine's (§4.5).
    pub fn rm(&self, registry_name: &str, package_name: &str, version: Option<SemVer>) -> Result<()> {
        self.update_one(registry_name)?;
        let mut registry = cosm_fs::load_registry(&self.depot.registry_file(registry_name))?;
        if !registry.packages.contains_key(package_name) {
            return Err(Error::NotFound(format!("package `{package_name}` is not in registry `{registry_name}`")));
        }

        let message = match version {
            Some(v) => {
                let mut versions = load_versions_or_empty(self.depot.root(), registry_name, package_name)?;
                if !versions.contains(&v) {
                    return Err(Error::NotFound(format!("{package_name}@{v} is not published")));
                }
                let version_dir = cosm_fs::paths::version_dir(
                    self.depot.root(),
                    registry_name,
                    package_name,
                    &v.to_string(),
                );
                fs_err::remove_dir_all(&version_dir).map_err(Error::from)?;
                versions.retain(|existing| *existing != v);
                cosm_fs::save_versions(
                    &cosm_fs::paths::versions_file(self.depot.root(), registry_name, package_name),
                    &versions,
                )?;
                format!("Removed version {v} of package {package_name}")
            }
            None => {
                let package_dir =
                    cosm_fs::paths::package_dir(self.depot.root(), registry_name, package_name);
                if package_dir.exists() {
                    fs_err::remove_dir_all(&package_dir).map_err(Error::from)?;
                }
                registry.packages.remove(package_name);
                cosm_fs::save_registry(&self.depot.registry_file(registry_name), &registry)?;
                format!("Removed package {package_name}")
            }
        };

        self.commit_and_push_registry(registry_name, &message)
    }

    /// Resolves `(name, version-or-latest)` against the given registries,
    /// in order. Returns every match; the caller disambiguates when more
    /// than one registry carries the package.
    pub fn find(&self, name: &str, version: Option<SemVer>, registries: &[String]) -> Result<Vec<PackageLocation>> {
        let mut results = Vec::new();
        for registry_name in registries {
            self.update_one(registry_name)?;
            let registry = cosm_fs::load_registry(&self.depot.registry_file(registry_name))?;
            if !registry.packages.contains_key(name) {
                continue;
            }

            let requested = match version {
                Some(v) => v,
                None => {
                    let versions = load_versions_or_empty(self.depot.root(), registry_name, name)?;
                    match versions.into_iter().reduce(SemVer::max) {
                        Some(latest) => latest,
                        None => continue,
                    }
                }
            };

            let specs_path =
                cosm_fs::paths::specs_file(self.depot.root(), registry_name, name, &requested.to_string());
            let specs: Specs = cosm_fs::load_specs(&specs_path)?;
            if specs.version != requested {
                return Err(Error::Malformed(format!(
                    "{registry_name}/{name}/{requested}: specs.json records version {} instead",
                    specs.version
                )));
            }

            results.push(PackageLocation {
                registry_name: registry_name.clone(),
                specs,
            });
        }

        if results.is_empty() {
            Err(Error::NotFound(format!("package `{name}` was not found in the given registries")))
        } else {
            Ok(results)
        }
    }

    /// `fetch origin`, `checkout <tag>`, re-read `Project.json`, resolve its
    /// own build list, record `specs.json`/`buildlist.json`, then always
    /// `checkout -` back regardless of outcome (§4.5, §4.7, §9).
    fn process_tag(
        &self,
        registry_name: &str,
        package_name: &str,
        uuid: Uuid,
        giturl: &str,
        version: SemVer,
        repo: &Repo,
    ) -> Result<()> {
        repo.fetch("origin")?;
        repo.checkout(&version.to_string())?;

        let outcome = (|| -> Result<(BTreeMap<String, DepEntry>, String, BuildList)> {
            let project = cosm_fs::load_project(&cosm_fs::paths::project_file(repo.dir()))?;
            let sha1 = repo.rev_list_one(&version.to_string())?;
            let build_list = cosm_resolver::resolve(&project.deps, self.depot)?;
            Ok((project.deps, sha1, build_list))
        })();

        if let Err(e) = repo.checkout_back() {
            warn!("checkout_back failed after processing tag {version}: {e}");
        }
        let (deps, sha1, build_list) = outcome?;

        let specs = Specs {
            name: package_name.to_owned(),
            uuid,
            version,
            giturl: giturl.to_owned(),
            sha1,
            deps,
        };
        let version_text = version.to_string();
        cosm_fs::save_specs(
            &cosm_fs::paths::specs_file(self.depot.root(), registry_name, package_name, &version_text),
            &specs,
        )?;
        cosm_fs::save_build_list(
            &cosm_fs::paths::buildlist_file(self.depot.root(), registry_name, package_name, &version_text),
            &build_list,
        )?;

        let mut versions = load_versions_or_empty(self.depot.root(), registry_name, package_name)?;
        if !versions.contains(&version) {
            versions.push(version);
            versions.sort();
            cosm_fs::save_versions(
                &cosm_fs::paths::versions_file(self.depot.root(), registry_name, package_name),
                &versions,
            )?;
        }
        info!("recorded {package_name}@{version_text} in registry {registry_name}");
        Ok(())
    }

    fn commit_and_push_registry(&self, registry_name: &str, message: &str) -> Result<()> {
        let repo = Repo::new(self.depot.registry_dir(registry_name));
        repo.add(&["."])?;
        repo.commit(message)?;
        let branch = repo.current_branch()?;
        repo.push(&branch, true)?;
        Ok(())
    }

}

impl std::fmt::Debug for RegistryEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEngine").field("depot_root", &self.depot.root()).finish()
    }
}

fn has_entries_besides_git(dir: &Utf8Path) -> Result<bool> {
    let entries = fs_err::read_dir(dir).map_err(Error::from)?;
    for entry in entries {
        let entry = entry.map_err(Error::from)?;
        if entry.file_name() != ".git" {
            return Ok(true);
        }
    }
    Ok(false)
}

fn load_versions_or_empty(depot_root: &Utf8Path, registry_name: &str, package_name: &str) -> Result<Vec<SemVer>> {
    let path = cosm_fs::paths::versions_file(depot_root, registry_name, package_name);
    match cosm_fs::load_versions(&path) {
        Ok(versions) => Ok(versions),
        Err(Error::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Version-4 UUIDs are the only shape the spec allows for package and
/// registry identity (§9).
fn is_v4_uuid(id: Uuid) -> bool {
    id.get_version() == Some(Version::Random)
}
