//! Owns the per-user depot (§3, §4.4, §6): `registries/`, `clones/`,
//! `packages/`, `templates/` under a root located by `COSM_DEPOT_PATH`.

mod prompt;

pub use prompt::{FixedPrompter, Prompter, StdinPrompter};

use camino::{Utf8Path, Utf8PathBuf};
use cosm_core::{Error, Result};
use tracing::{debug, info};

const DEPOT_ENV_VAR: &str = "COSM_DEPOT_PATH";
const TEMPLATES_ENV_VAR: &str = "COSM_TEMPLATES_URL";

/// A located, initialized depot root. Cheap to clone; holds only a path.
#[derive(Debug, Clone)]
pub struct Depot {
    root: Utf8PathBuf,
}

impl Depot {
    pub fn open(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn registries_list_file(&self) -> Utf8PathBuf {
        cosm_fs::paths::registries_list_file(&self.root)
    }

    pub fn registry_dir(&self, name: &str) -> Utf8PathBuf {
        cosm_fs::paths::registry_dir(&self.root, name)
    }

    pub fn registry_file(&self, name: &str) -> Utf8PathBuf {
        cosm_fs::paths::registry_file(&self.root, name)
    }

    pub fn clone_dir(&self, uuid: &uuid::Uuid) -> Utf8PathBuf {
        cosm_fs::paths::clone_dir(&self.root, uuid)
    }

    pub fn tmp_clone_dir(&self) -> Utf8PathBuf {
        cosm_fs::paths::tmp_clone_dir(&self.root)
    }

    pub fn package_content_dir(&self, package_name: &str, sha1: &str) -> Utf8PathBuf {
        cosm_fs::paths::package_content_dir(&self.root, package_name, sha1)
    }

    /// Lists the registered registry names, validating the invariant that
    /// `registries.json` names are exactly the subdirectories of
    /// `registries/` that are valid registries.
    pub fn registry_names(&self) -> Result<Vec<String>> {
        cosm_fs::load_registry_names(&self.registries_list_file())
    }

    pub fn save_registry_names(&self, names: &[String]) -> Result<()> {
        cosm_fs::save_registry_names(&self.registries_list_file(), names)
    }
}

/// Returns the depot rooted at `COSM_DEPOT_PATH`, initializing it if this
/// is the first run. Prompts once via `prompter` if the variable is unset,
/// unless `auto` requests prompt-free operation (spec C10: "prompt-free by
/// default in automation paths"), in which case an unset variable is an
/// `ArgError`.
pub fn locate_or_init(prompter: &mut dyn Prompter, auto: bool) -> Result<Depot> {
    match std::env::var(DEPOT_ENV_VAR) {
        Ok(value) if !value.is_empty() => {
            let root = Utf8PathBuf::from(value);
            init(&root)?;
            Ok(Depot::open(root))
        }
        _ if auto => Err(Error::ArgError(format!(
            "{DEPOT_ENV_VAR} is not set; set it, or run interactively to be prompted once"
        ))),
        _ => {
            let default = default_depot_path()?;
            let root = prompter.ask_depot_path(&default)?;
            init(&root)?;
            persist_export_line(&root)?;
            Ok(Depot::open(root))
        }
    }
}

/// Returns the depot at `COSM_DEPOT_PATH`, failing if it is unset or not
/// yet initialized. Used by read paths (e.g. activation) that must never
/// prompt or mutate a shell profile.
pub fn locate() -> Result<Depot> {
    let value = std::env::var(DEPOT_ENV_VAR)
        .map_err(|_| Error::NotFound(format!("{DEPOT_ENV_VAR} is not set")))?;
    let root = Utf8PathBuf::from(value);
    if !root.join("registries").join("registries.json").exists() {
        return Err(Error::NotFound(format!("no cosm depot initialized at {root}")));
    }
    Ok(Depot::open(root))
}

fn default_depot_path() -> Result<Utf8PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::NotFound("could not determine the user's home directory".into()))?;
    Utf8PathBuf::from_path_buf(home.join(".cosm"))
        .map_err(|p| Error::Malformed(format!("home directory is not valid UTF-8: {p:?}")))
}

/// Creates the required depot subtree if absent. Idempotent: a directory
/// that already has `registries/registries.json` is left untouched.
/// Refuses to initialize into a directory that exists, is non-empty, and
/// does not already look like a depot.
fn init(root: &Utf8Path) -> Result<()> {
    if cosm_fs::paths::registries_list_file(root).exists() {
        debug!("depot already initialized at {root}");
        return Ok(());
    }

    if root.exists() {
        let has_entries = fs_err::read_dir(root)
            .map_err(Error::from)?
            .next()
            .is_some();
        if has_entries {
            return Err(Error::RepoState(format!(
                "{root} is not empty; refusing to initialize a depot there"
            )));
        }
    }

    info!("initializing cosm depot at {root}");
    fs_err::create_dir_all(cosm_fs::paths::registries_dir(root)).map_err(Error::from)?;
    cosm_fs::save_registry_names(&cosm_fs::paths::registries_list_file(root), &[])?;
    fs_err::create_dir_all(cosm_fs::paths::clones_dir(root)).map_err(Error::from)?;
    fs_err::create_dir_all(cosm_fs::paths::packages_dir(root)).map_err(Error::from)?;
    init_templates(root)?;
    Ok(())
}

/// Populates `templates/` by cloning the external templates repository.
/// The spec names this repository "in §6" but no concrete URL is given
/// there; rather than fabricate one, the URL is read from
/// `COSM_TEMPLATES_URL` and templates are left empty when it is unset
/// (documented as an open-question resolution in DESIGN.md).
fn init_templates(root: &Utf8Path) -> Result<()> {
    let dir = cosm_fs::paths::templates_dir(root);
    if dir.exists() {
        return Ok(());
    }
    match std::env::var(TEMPLATES_ENV_VAR) {
        Ok(url) if !url.is_empty() => cosm_git::clone(&url, &dir).map_err(Error::from),
        _ => fs_err::create_dir_all(&dir).map_err(Error::from),
    }
}

/// Appends an `export COSM_DEPOT_PATH=...` line to the user's shell
/// profile, once. Picks `.zprofile` when `$SHELL` mentions zsh, else
/// `.bash_profile`, matching common login-shell conventions.
fn persist_export_line(root: &Utf8Path) -> Result<()> {
    let Some(home) = dirs::home_dir() else {
        return Ok(());
    };
    let shell = std::env::var("SHELL").unwrap_or_default();
    let profile_name = if shell.contains("zsh") { ".zprofile" } else { ".bash_profile" };
    let profile = home.join(profile_name);

    let export_line = format!("export {DEPOT_ENV_VAR}=\"{root}\"\n");
    let already_present = fs_err::read_to_string(&profile)
        .map(|content| content.contains(DEPOT_ENV_VAR))
        .unwrap_or(false);
    if already_present {
        return Ok(());
    }

    use std::io::Write as _;
    let mut file = fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&profile)
        .map_err(Error::from)?;
    file.write_all(export_line.as_bytes()).map_err(Error::from)?;
    info!("appended {DEPOT_ENV_VAR} export to {}", profile.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        (dir, path)
    }

    #[test]
    fn init_creates_required_subtree() {
        let (_tmp, root) = utf8_tempdir();
        let depot_root = root.join("depot");
        init(&depot_root).unwrap();
        assert!(depot_root.join("registries").join("registries.json").exists());
        assert!(depot_root.join("clones").is_dir());
        assert!(depot_root.join("packages").is_dir());
        assert!(depot_root.join("templates").is_dir());
        assert_eq!(Depot::open(depot_root).registry_names().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn init_is_idempotent() {
        let (_tmp, root) = utf8_tempdir();
        init(&root).unwrap();
        cosm_fs::save_registry_names(&cosm_fs::paths::registries_list_file(&root), &["reg".into()]).unwrap();
        init(&root).unwrap();
        assert_eq!(Depot::open(root.clone()).registry_names().unwrap(), vec!["reg".to_owned()]);
    }

    #[test]
    fn init_refuses_non_empty_foreign_directory() {
        let (_tmp, root) = utf8_tempdir();
        fs_err::write(root.join("unrelated.txt"), b"hi").unwrap();
        let err = init(&root).unwrap_err();
        assert!(matches!(err, Error::RepoState(_)));
    }

    #[test]
    fn locate_or_init_uses_fixed_prompter_when_env_unset() {
        let (_tmp, root) = utf8_tempdir();
        // SAFETY: tests in this crate do not run this one concurrently with
        // another test that reads COSM_DEPOT_PATH from the real environment.
        unsafe { std::env::remove_var(DEPOT_ENV_VAR) };
        let depot_root = root.join("depot");
        let mut prompter = FixedPrompter(depot_root.clone());
        let depot = locate_or_init(&mut prompter, false).unwrap();
        assert_eq!(depot.root(), depot_root);
        assert!(cosm_fs::paths::registries_list_file(&depot_root).exists());
    }

    #[test]
    fn locate_or_init_auto_without_env_var_fails() {
        unsafe { std::env::remove_var(DEPOT_ENV_VAR) };
        let mut prompter = FixedPrompter(Utf8PathBuf::from("/should-not-be-used"));
        let err = locate_or_init(&mut prompter, true).unwrap_err();
        assert!(matches!(err, Error::ArgError(_)));
    }
}
