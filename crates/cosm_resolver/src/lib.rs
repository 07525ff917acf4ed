//! Minimum Version Selection (§4.8): computes a build list from a direct
//! dependency map and the pre-computed build lists already stored in
//! registries for each dependency.
//!
//! The resolver never recurses on a dependency's own `deps` map. Per the
//! source's cyclic-metadata hazard, each transitive edge is consumed as a
//! flat `buildlist.json` entry, not a recursive call, which makes a
//! dependency cycle a non-issue by construction (there is no call stack to
//! overflow).

use std::collections::BTreeMap;

use cosm_core::{bucket_key, split_bucket_key, BuildEntry, BuildList, DepEntry, Error, Result};
use cosm_depot::Depot;
use tracing::debug;

/// Computes the build list for `deps` (a project's or a package version's
/// own dependency map) against everything currently known to `depot`.
pub fn resolve(deps: &BTreeMap<String, DepEntry>, depot: &Depot) -> Result<BuildList> {
    let mut build_list = BuildList::new();
    for (key, dep) in deps {
        let (uuid, major) = split_bucket_key(key)?;
        let (specs, transitive) = locate(depot, &dep.name, uuid, dep.version)?;
        let own_key = bucket_key(uuid, major);
        build_list.merge(own_key, BuildEntry::from_specs(&specs));
        build_list.merge_all(&transitive);
    }
    Ok(build_list)
}

/// Finds the registry that carries `(name, uuid)` at `version`, returning
/// its `specs.json` and `buildlist.json`. Registries are searched in the
/// order `registries.json` lists them; the first match wins.
fn locate(
    depot: &Depot,
    name: &str,
    uuid: uuid::Uuid,
    version: cosm_semver::SemVer,
) -> Result<(cosm_core::Specs, BuildList)> {
    for registry_name in depot.registry_names()? {
        let registry = cosm_fs::load_registry(&depot.registry_file(&registry_name))?;
        let Some(package) = registry.packages.get(name) else {
            continue;
        };
        if package.uuid != uuid {
            continue;
        }

        let version_text = version.to_string();
        let specs_path =
            cosm_fs::paths::specs_file(depot.root(), &registry_name, name, &version_text);
        let specs = cosm_fs::load_specs(&specs_path)?;
        if specs.version != version {
            return Err(Error::Malformed(format!(
                "{registry_name}/{name}/{version_text}: specs.json records version {} instead",
                specs.version
            )));
        }

        let buildlist_path =
            cosm_fs::paths::buildlist_file(depot.root(), &registry_name, name, &version_text);
        let transitive = cosm_fs::load_build_list(&buildlist_path)?;
        debug!("resolved {name}@{version_text} from registry {registry_name}");
        return Ok((specs, transitive));
    }
    Err(Error::NotFound(format!(
        "dependency {name}@{version} (uuid {uuid}) was not found in any registry"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use cosm_core::{PackageInfo, Registry, Specs};
    use cosm_semver::SemVer;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn depot() -> (tempfile::TempDir, Depot) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        cosm_fs::save_registry_names(&cosm_fs::paths::registries_list_file(&root), &["main".into()])
            .unwrap();
        (dir, Depot::open(root))
    }

    fn publish(
        depot: &Depot,
        registry: &mut Registry,
        name: &str,
        uuid: Uuid,
        version: SemVer,
        deps: BTreeMap<String, DepEntry>,
        transitive: BuildList,
    ) {
        registry.packages.insert(
            name.to_owned(),
            PackageInfo {
                uuid,
                giturl: format!("git://{name}"),
            },
        );
        cosm_fs::save_registry(&depot.registry_file(&registry.name), registry).unwrap();

        let version_text = version.to_string();
        let specs = Specs {
            name: name.to_owned(),
            uuid,
            version,
            giturl: format!("git://{name}"),
            sha1: format!("{name}-{version_text}-sha"),
            deps,
        };
        cosm_fs::save_specs(
            &cosm_fs::paths::specs_file(depot.root(), &registry.name, name, &version_text),
            &specs,
        )
        .unwrap();
        cosm_fs::save_build_list(
            &cosm_fs::paths::buildlist_file(depot.root(), &registry.name, name, &version_text),
            &transitive,
        )
        .unwrap();
    }

    fn uuid(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    fn dep(name: &str, uuid: Uuid, version: SemVer) -> (String, DepEntry) {
        (
            bucket_key(uuid, version.major),
            DepEntry {
                name: name.to_owned(),
                version,
                develop: false,
            },
        )
    }

    /// S1: A -> B@v1.2, C@v1.2; B@v1.2 -> D@v1.3; C@v1.2 -> D@v1.4;
    /// D@v1.3 -> E@v1.2; D@v1.4 -> E@v1.2. Expect A's build list to hold
    /// B@v1.2, C@v1.2, D@v1.4 (max of 1.3/1.4), E@v1.2.
    #[test]
    fn diamond_with_transitive_upgrade_keeps_the_max_of_each_bucket() {
        let (_tmp, depot) = depot();
        let mut registry = Registry::new("main".into(), uuid(0), "git://main".into());

        let (b, c, d, e) = (uuid(1), uuid(2), uuid(3), uuid(4));
        let e_entry = BuildEntry {
            name: "e".into(),
            uuid: e,
            version: SemVer::new(1, 2, 0),
            giturl: "git://e".into(),
            sha1: "e-sha".into(),
        };
        let mut d13_list = BuildList::new();
        d13_list.merge(bucket_key(e, 1), e_entry.clone());
        let mut d14_list = BuildList::new();
        d14_list.merge(bucket_key(e, 1), e_entry);

        publish(&depot, &mut registry, "e", e, SemVer::new(1, 2, 0), BTreeMap::new(), BuildList::new());
        publish(
            &depot,
            &mut registry,
            "d",
            d,
            SemVer::new(1, 3, 0),
            BTreeMap::from([dep("e", e, SemVer::new(1, 2, 0))]),
            d13_list,
        );
        publish(
            &depot,
            &mut registry,
            "d",
            d,
            SemVer::new(1, 4, 0),
            BTreeMap::from([dep("e", e, SemVer::new(1, 2, 0))]),
            d14_list,
        );
        let mut b_list = BuildList::new();
        b_list.merge(
            bucket_key(d, 1),
            BuildEntry {
                name: "d".into(),
                uuid: d,
                version: SemVer::new(1, 3, 0),
                giturl: "git://d".into(),
                sha1: "d-v1.3.0-sha".into(),
            },
        );
        publish(
            &depot,
            &mut registry,
            "b",
            b,
            SemVer::new(1, 2, 0),
            BTreeMap::from([dep("d", d, SemVer::new(1, 3, 0))]),
            b_list,
        );
        let mut c_list = BuildList::new();
        c_list.merge(
            bucket_key(d, 1),
            BuildEntry {
                name: "d".into(),
                uuid: d,
                version: SemVer::new(1, 4, 0),
                giturl: "git://d".into(),
                sha1: "d-v1.4.0-sha".into(),
            },
        );
        publish(
            &depot,
            &mut registry,
            "c",
            c,
            SemVer::new(1, 2, 0),
            BTreeMap::from([dep("d", d, SemVer::new(1, 4, 0))]),
            c_list,
        );

        let a_deps = BTreeMap::from([
            dep("b", b, SemVer::new(1, 2, 0)),
            dep("c", c, SemVer::new(1, 2, 0)),
        ]);
        let build_list = resolve(&a_deps, &depot).unwrap();

        assert_eq!(build_list.len(), 4);
        assert_eq!(build_list.get(&bucket_key(b, 1)).unwrap().version, SemVer::new(1, 2, 0));
        assert_eq!(build_list.get(&bucket_key(c, 1)).unwrap().version, SemVer::new(1, 2, 0));
        assert_eq!(build_list.get(&bucket_key(d, 1)).unwrap().version, SemVer::new(1, 4, 0));
        assert_eq!(build_list.get(&bucket_key(e, 1)).unwrap().version, SemVer::new(1, 2, 0));
    }

    /// S2: F@v1.1 depends on G@v1.1 (stored flat in F's buildlist.json) and
    /// vice versa. Resolving a project that depends only on F must
    /// terminate and still surface G.
    #[test]
    fn cyclic_package_metadata_terminates_and_resolves() {
        let (_tmp, depot) = depot();
        let mut registry = Registry::new("main".into(), uuid(0), "git://main".into());
        let (f, g) = (uuid(5), uuid(6));

        let mut f_list = BuildList::new();
        f_list.merge(
            bucket_key(g, 1),
            BuildEntry {
                name: "g".into(),
                uuid: g,
                version: SemVer::new(1, 1, 0),
                giturl: "git://g".into(),
                sha1: "g-sha".into(),
            },
        );
        let mut g_list = BuildList::new();
        g_list.merge(
            bucket_key(f, 1),
            BuildEntry {
                name: "f".into(),
                uuid: f,
                version: SemVer::new(1, 1, 0),
                giturl: "git://f".into(),
                sha1: "f-sha".into(),
            },
        );
        publish(
            &depot,
            &mut registry,
            "f",
            f,
            SemVer::new(1, 1, 0),
            BTreeMap::from([dep("g", g, SemVer::new(1, 1, 0))]),
            f_list,
        );
        publish(
            &depot,
            &mut registry,
            "g",
            g,
            SemVer::new(1, 1, 0),
            BTreeMap::from([dep("f", f, SemVer::new(1, 1, 0))]),
            g_list,
        );

        let project_deps = BTreeMap::from([dep("f", f, SemVer::new(1, 1, 0))]);
        let build_list = resolve(&project_deps, &depot).unwrap();

        assert_eq!(build_list.len(), 2);
        assert!(build_list.get(&bucket_key(f, 1)).is_some());
        assert!(build_list.get(&bucket_key(g, 1)).is_some());
    }

    #[test]
    fn missing_dependency_is_not_found() {
        let (_tmp, depot) = depot();
        let missing = BTreeMap::from([dep("ghost", uuid(9), SemVer::new(1, 0, 0))]);
        let err = resolve(&missing, &depot).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
