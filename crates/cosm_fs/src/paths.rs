//! The on-disk layout of spec §6, as a set of pure path-building functions.
//! Nothing here touches the filesystem; callers combine these with
//! [`crate::store`] to read or write.

use camino::{Utf8Path, Utf8PathBuf};

pub const PROJECT_FILE: &str = "Project.json";
pub const REGISTRY_FILE: &str = "registry.json";
pub const VERSIONS_FILE: &str = "versions.json";
pub const SPECS_FILE: &str = "specs.json";
pub const BUILDLIST_FILE: &str = "buildlist.json";
pub const REGISTRIES_LIST_FILE: &str = "registries.json";
pub const COSM_DIR: &str = ".cosm";
pub const ENV_FILE: &str = ".env";
pub const BASHRC_FILE: &str = ".bashrc";

pub fn registries_dir(depot_root: &Utf8Path) -> Utf8PathBuf {
    depot_root.join("registries")
}

pub fn registries_list_file(depot_root: &Utf8Path) -> Utf8PathBuf {
    registries_dir(depot_root).join(REGISTRIES_LIST_FILE)
}

pub fn registry_dir(depot_root: &Utf8Path, registry_name: &str) -> Utf8PathBuf {
    registries_dir(depot_root).join(registry_name)
}

pub fn registry_file(depot_root: &Utf8Path, registry_name: &str) -> Utf8PathBuf {
    registry_dir(depot_root, registry_name).join(REGISTRY_FILE)
}

/// Directory sharding: the upper-case first letter of the package name.
pub fn shard_letter(package_name: &str) -> String {
    package_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "_".to_owned())
}

pub fn package_dir(depot_root: &Utf8Path, registry_name: &str, package_name: &str) -> Utf8PathBuf {
    registry_dir(depot_root, registry_name)
        .join(shard_letter(package_name))
        .join(package_name)
}

pub fn versions_file(depot_root: &Utf8Path, registry_name: &str, package_name: &str) -> Utf8PathBuf {
    package_dir(depot_root, registry_name, package_name).join(VERSIONS_FILE)
}

pub fn version_dir(
    depot_root: &Utf8Path,
    registry_name: &str,
    package_name: &str,
    version: &str,
) -> Utf8PathBuf {
    package_dir(depot_root, registry_name, package_name).join(version)
}

pub fn specs_file(
    depot_root: &Utf8Path,
    registry_name: &str,
    package_name: &str,
    version: &str,
) -> Utf8PathBuf {
    version_dir(depot_root, registry_name, package_name, version).join(SPECS_FILE)
}

pub fn buildlist_file(
    depot_root: &Utf8Path,
    registry_name: &str,
    package_name: &str,
    version: &str,
) -> Utf8PathBuf {
    version_dir(depot_root, registry_name, package_name, version).join(BUILDLIST_FILE)
}

pub fn clones_dir(depot_root: &Utf8Path) -> Utf8PathBuf {
    depot_root.join("clones")
}

pub fn clone_dir(depot_root: &Utf8Path, uuid: &uuid::Uuid) -> Utf8PathBuf {
    clones_dir(depot_root).join(uuid.to_string())
}

pub fn tmp_clone_dir(depot_root: &Utf8Path) -> Utf8PathBuf {
    clones_dir(depot_root).join("tmp-clone")
}

pub fn packages_dir(depot_root: &Utf8Path) -> Utf8PathBuf {
    depot_root.join("packages")
}

pub fn package_content_dir(depot_root: &Utf8Path, package_name: &str, sha1: &str) -> Utf8PathBuf {
    packages_dir(depot_root).join(package_name).join(sha1)
}

pub fn templates_dir(depot_root: &Utf8Path) -> Utf8PathBuf {
    depot_root.join("templates")
}

pub fn project_file(workdir: &Utf8Path) -> Utf8PathBuf {
    workdir.join(PROJECT_FILE)
}

pub fn cosm_dir(workdir: &Utf8Path) -> Utf8PathBuf {
    workdir.join(COSM_DIR)
}

pub fn activation_buildlist_file(workdir: &Utf8Path) -> Utf8PathBuf {
    cosm_dir(workdir).join(BUILDLIST_FILE)
}

pub fn activation_env_file(workdir: &Utf8Path) -> Utf8PathBuf {
    cosm_dir(workdir).join(ENV_FILE)
}

pub fn activation_bashrc_file(workdir: &Utf8Path) -> Utf8PathBuf {
    cosm_dir(workdir).join(BASHRC_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_dir_shards_on_upper_first_letter() {
        let root = Utf8Path::new("/depot");
        assert_eq!(
            package_dir(root, "reg", "left-pad"),
            Utf8PathBuf::from("/depot/registries/reg/L/left-pad")
        );
    }
}
