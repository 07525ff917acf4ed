//! Wraps the external `git` executable. No component in this workspace
//! talks to a Git repository any other way: there is no libgit2 binding and
//! no ambient `chdir` — every call takes its working directory explicitly
//! (spec §9, "process-wide current directory as state" is the hazard this
//! crate is designed to avoid).

mod driver;
mod repo;

pub use driver::{
    add, checkout, checkout_back, clone, commit, config_global, current_branch, fetch,
    fetch_tags, list_tags, pull, push, rev_list_count, rev_list_one, status_porcelain, tag,
};
pub use repo::Repo;

use camino::Utf8PathBuf;

/// A `git` invocation that exited non-zero, or whose output could not be
/// interpreted, wrapped with enough context to explain itself without a
/// caller needing to re-run the command to find out what happened.
#[derive(Debug, Clone, thiserror::Error)]
#[error("git error in {dir}: {context}\n{stderr}")]
pub struct GitError {
    pub dir: Utf8PathBuf,
    pub context: String,
    pub stderr: String,
}

#[cfg(any(test, feature = "test_fixture"))]
pub mod test_fixture {
    //! Helpers for standing up a throwaway local repository to act as a
    //! remote in tests, without touching the network.
    use super::*;
    use camino::Utf8Path;

    /// Initializes `dir` as a git repository, configures a throwaway
    /// identity, and creates an initial commit. Mirrors the
    /// init-then-throwaway-identity-commit dance release tooling uses to
    /// give an extracted package tree a `.git` directory worth comparing.
    pub fn init_repo_with_commit(dir: &Utf8Path) -> Result<(), GitError> {
        driver::run(dir, &["init"])?;
        driver::run(dir, &["config", "user.email", "test@cosm.local"])?;
        driver::run(dir, &["config", "user.name", "cosm-test"])?;
        driver::run(dir, &["add", "."])?;
        driver::run(dir, &["commit", "--allow-empty", "-m", "init"])?;
        Ok(())
    }
}
