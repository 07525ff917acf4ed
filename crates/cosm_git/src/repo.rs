use camino::{Utf8Path, Utf8PathBuf};

use crate::{driver, GitError};

/// A Git working copy bound to one directory.
///
/// Free functions in this crate take a directory on every call, which is
/// right for one-shot operations (materializing a package checkout) but
/// tedious for a sequence of operations against the same working copy
/// (registry add, project release). `Repo` binds the directory once.
#[derive(Debug, Clone)]
pub struct Repo {
    dir: Utf8PathBuf,
}

impl Repo {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn fetch(&self, remote: &str) -> Result<(), GitError> {
        driver::fetch(&self.dir, remote)
    }

    pub fn fetch_tags(&self) -> Result<(), GitError> {
        driver::fetch_tags(&self.dir)
    }

    pub fn pull(&self, branch: &str) -> Result<(), GitError> {
        driver::pull(&self.dir, branch)
    }

    pub fn checkout(&self, ref_or_sha: &str) -> Result<(), GitError> {
        driver::checkout(&self.dir, ref_or_sha)
    }

    pub fn checkout_back(&self) -> Result<(), GitError> {
        driver::checkout_back(&self.dir)
    }

    pub fn tag(&self, name: &str) -> Result<(), GitError> {
        driver::tag(&self.dir, name)
    }

    pub fn tag_exists(&self, name: &str) -> Result<bool, GitError> {
        Ok(self.list_tags()?.iter().any(|t| t == name))
    }

    pub fn list_tags(&self) -> Result<Vec<String>, GitError> {
        driver::list_tags(&self.dir)
    }

    pub fn push(&self, refname: &str, ignore_up_to_date: bool) -> Result<(), GitError> {
        driver::push(&self.dir, refname, ignore_up_to_date)
    }

    pub fn current_branch(&self) -> Result<String, GitError> {
        driver::current_branch(&self.dir)
    }

    pub fn rev_list_one(&self, refname: &str) -> Result<String, GitError> {
        driver::rev_list_one(&self.dir, refname)
    }

    pub fn current_commit_hash(&self) -> Result<String, GitError> {
        self.rev_list_one("HEAD")
    }

    pub fn status_porcelain(&self) -> Result<String, GitError> {
        driver::status_porcelain(&self.dir)
    }

    pub fn is_clean(&self) -> Result<bool, GitError> {
        Ok(self.status_porcelain()?.trim().is_empty())
    }

    pub fn rev_list_count(&self, from_ref: &str, to_ref: &str) -> Result<u64, GitError> {
        driver::rev_list_count(&self.dir, from_ref, to_ref)
    }

    /// How many commits `origin/<branch>` has that the local branch lacks.
    /// Used by `release` to refuse to tag a branch that is behind origin.
    pub fn commits_behind(&self, branch: &str) -> Result<u64, GitError> {
        self.fetch("origin")?;
        let origin_branch = format!("origin/{branch}");
        self.rev_list_count("HEAD", &origin_branch)
    }

    pub fn add(&self, paths: &[&str]) -> Result<(), GitError> {
        driver::add(&self.dir, paths)
    }

    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        driver::commit(&self.dir, message)
    }
}
