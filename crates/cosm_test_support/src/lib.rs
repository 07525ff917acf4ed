//! Fixtures shared by the engine crates' test suites: a throwaway Git
//! remote/working copy and a throwaway depot tree, plus test-scoped tracing
//! init. Mirrors the shape of a removed internal logging-test crate and the
//! `tests/all/helpers` fixtures this workspace's release tooling used.

use camino::Utf8PathBuf;
use cosm_core::Project;
use cosm_git::Repo;
use uuid::Uuid;

/// Initializes a `tracing` subscriber that writes to the test harness's
/// captured output. Safe to call from every test; only the first call in a
/// process takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// A throwaway Git working copy, rooted in a directory that is removed when
/// the value is dropped.
pub struct TestRepo {
    _dir: tempfile::TempDir,
    _origin_dir: Option<tempfile::TempDir>,
    pub path: Utf8PathBuf,
    pub repo: Repo,
}

impl TestRepo {
    /// A local repository with a throwaway identity, an initial commit, and
    /// a bare `origin` remote already holding that commit — so `fetch`,
    /// `commits_behind`, and `push` all behave the way they would against a
    /// real remote, without hitting `receive.denyCurrentBranch` (see
    /// [`Self::init_bare_remote`] when only a push *target* is needed).
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_owned()).expect("utf8 tempdir");
        cosm_git::test_fixture::init_repo_with_commit(&path).expect("init fixture repo");
        let repo = Repo::new(path.clone());

        let origin_dir = tempfile::tempdir().expect("tempdir");
        let origin_path = Utf8PathBuf::from_path_buf(origin_dir.path().to_owned()).expect("utf8 tempdir");
        std::process::Command::new("git")
            .args(["init", "--bare", origin_path.as_str()])
            .status()
            .expect("spawn git init --bare");
        std::process::Command::new("git")
            .args(["remote", "add", "origin", origin_path.as_str()])
            .current_dir(&path)
            .status()
            .expect("spawn git remote add");
        let branch = repo.current_branch().expect("current branch");
        repo.push(&branch, true).expect("seed origin with initial commit");

        Self {
            _dir: dir,
            _origin_dir: Some(origin_dir),
            path,
            repo,
        }
    }

    /// A bare repository suitable as a `clone`/`push` target: has no
    /// working tree of its own, so a subsequent `git push` never fails with
    /// "refusing to update checked out branch".
    pub fn init_bare_remote() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_owned()).expect("utf8 tempdir");
        std::process::Command::new("git")
            .args(["init", "--bare", path.as_str()])
            .status()
            .expect("spawn git init --bare");
        let repo = Repo::new(path.clone());
        Self { _dir: dir, _origin_dir: None, path, repo }
    }

    pub fn url(&self) -> String {
        self.path.to_string()
    }

    /// Writes `Project.json` at the working-copy root.
    pub fn write_project(&self, project: &Project) {
        cosm_fs::save_project(&cosm_fs::paths::project_file(&self.path), project).expect("write Project.json");
    }

    /// Stages everything, commits, and pushes `branch` to `origin`, the
    /// sequence every registry/project fixture needs to publish a state for
    /// a test to read back.
    pub fn commit_and_push(&self, message: &str, branch: &str) {
        self.repo.add(&["."]).expect("git add");
        self.repo.commit(message).expect("git commit");
        self.repo.push(branch, true).expect("git push");
    }
}

/// A throwaway depot tree: the subset of [`cosm_depot::Depot::open`]'s
/// expectations a test needs, built directly from `cosm_fs` so tests don't
/// depend on `cosm_depot`'s interactive-prompt path.
pub struct TestDepot {
    _dir: tempfile::TempDir,
    pub depot: cosm_depot::Depot,
}

impl TestDepot {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().join("depot")).expect("utf8 tempdir");
        fs_err::create_dir_all(cosm_fs::paths::registries_dir(&root)).expect("mkdir registries");
        cosm_fs::save_registry_names(&cosm_fs::paths::registries_list_file(&root), &[])
            .expect("write empty registries.json");
        fs_err::create_dir_all(cosm_fs::paths::clones_dir(&root)).expect("mkdir clones");
        fs_err::create_dir_all(cosm_fs::paths::packages_dir(&root)).expect("mkdir packages");
        fs_err::create_dir_all(cosm_fs::paths::templates_dir(&root)).expect("mkdir templates");
        Self {
            _dir: dir,
            depot: cosm_depot::Depot::open(root),
        }
    }
}

impl Default for TestDepot {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh v4 UUID, for test data that doesn't care which one it gets.
pub fn new_uuid() -> Uuid {
    Uuid::new_v4()
}
