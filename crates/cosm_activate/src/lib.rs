//! Activation (§4.9): validates a project's cached build list against
//! `Project.json` and regenerates it when stale. Read-only with respect to
//! the depot — no registry, clone, or package directory is ever mutated
//! here, which is why this crate reaches for [`cosm_depot::locate`] (the
//! strict variant) rather than `locate_or_init`.

use camino::Utf8Path;
use cosm_core::Result;
use cosm_depot::Depot;
use tracing::{debug, info};

/// Whether the last `activate()` call rebuilt the cache or found it fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    UpToDate,
    Rebuilt,
}

/// Runs activation at `workdir` (§4.9). Requires `Project.json` to exist.
pub fn activate(workdir: &Utf8Path, depot: &Depot) -> Result<ActivationOutcome> {
    let project_path = cosm_fs::paths::project_file(workdir);
    let project = cosm_fs::load_project(&project_path)?;

    if is_fresh(workdir)? {
        debug!("build list cache is fresh, nothing to do");
        return Ok(ActivationOutcome::UpToDate);
    }

    fs_err::create_dir_all(cosm_fs::paths::cosm_dir(workdir))?;
    ensure_file(&cosm_fs::paths::activation_env_file(workdir), "")?;
    ensure_file(&cosm_fs::paths::activation_bashrc_file(workdir), bashrc_contents())?;

    let build_list = cosm_resolver::resolve(&project.deps, depot)?;
    cosm_fs::save_build_list(&cosm_fs::paths::activation_buildlist_file(workdir), &build_list)?;
    info!("activated {} ({} dependencies resolved)", project.name, build_list.len());
    Ok(ActivationOutcome::Rebuilt)
}

/// `.cosm/buildlist.json` is fresh when it exists and its mtime is at or
/// after `Project.json`'s (§4.9: "after or equal to").
fn is_fresh(workdir: &Utf8Path) -> Result<bool> {
    let buildlist_path = cosm_fs::paths::activation_buildlist_file(workdir);
    if !buildlist_path.exists() {
        return Ok(false);
    }
    let project_mtime = fs_err::metadata(cosm_fs::paths::project_file(workdir))?.modified()?;
    let buildlist_mtime = fs_err::metadata(&buildlist_path)?.modified()?;
    Ok(buildlist_mtime >= project_mtime)
}

/// Writes `path` only if absent, so a rebuild never clobbers whatever a
/// user may have appended to their own `.env`/`.bashrc`.
fn ensure_file(path: &Utf8Path, contents: &str) -> Result<()> {
    if !path.exists() {
        fs_err::write(path, contents)?;
    }
    Ok(())
}

fn bashrc_contents() -> &'static str {
    "# sourced by a shell that wants this project's resolved dependencies on PATH\n\
     export COSM_ACTIVE=1\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosm_core::Project;
    use cosm_semver::SemVer;
    use cosm_test_support::TestDepot;
    use uuid::Uuid;

    fn project_dir(name: &str) -> (tempfile::TempDir, camino::Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let project = Project {
            name: name.into(),
            uuid: Uuid::new_v4(),
            authors: vec![],
            language: None,
            version: SemVer::new(0, 1, 0),
            deps: Default::default(),
        };
        cosm_fs::save_project(&cosm_fs::paths::project_file(&path), &project).unwrap();
        (dir, path)
    }

    #[test]
    fn first_activation_rebuilds_and_creates_scaffolding() {
        let (_tmp, workdir) = project_dir("app");
        let depot = TestDepot::new();
        let outcome = activate(&workdir, &depot.depot).unwrap();
        assert_eq!(outcome, ActivationOutcome::Rebuilt);
        assert!(cosm_fs::paths::activation_buildlist_file(&workdir).exists());
        assert!(cosm_fs::paths::activation_env_file(&workdir).exists());
        assert!(cosm_fs::paths::activation_bashrc_file(&workdir).exists());
    }

    #[test]
    fn second_activation_without_changes_is_a_no_op() {
        let (_tmp, workdir) = project_dir("app");
        let depot = TestDepot::new();
        activate(&workdir, &depot.depot).unwrap();
        let buildlist_path = cosm_fs::paths::activation_buildlist_file(&workdir);
        let first_mtime = fs_err::metadata(&buildlist_path).unwrap().modified().unwrap();

        let outcome = activate(&workdir, &depot.depot).unwrap();
        assert_eq!(outcome, ActivationOutcome::UpToDate);
        let second_mtime = fs_err::metadata(&buildlist_path).unwrap().modified().unwrap();
        assert_eq!(first_mtime, second_mtime);
    }

    #[test]
    fn touching_project_after_activation_triggers_a_rebuild() {
        let (_tmp, workdir) = project_dir("app");
        let depot = TestDepot::new();
        activate(&workdir, &depot.depot).unwrap();

        // Simulate an edit: rewrite Project.json so its mtime moves forward
        // far enough to clear filesystem mtime-resolution granularity.
        std::thread::sleep(std::time::Duration::from_millis(20));
        let project = cosm_fs::load_project(&cosm_fs::paths::project_file(&workdir)).unwrap();
        cosm_fs::save_project(&cosm_fs::paths::project_file(&workdir), &project).unwrap();

        let outcome = activate(&workdir, &depot.depot).unwrap();
        assert_eq!(outcome, ActivationOutcome::Rebuilt);
    }

    #[test]
    fn activation_without_a_project_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = camino::Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let depot = TestDepot::new();
        assert!(activate(&workdir, &depot.depot).is_err());
    }
}
