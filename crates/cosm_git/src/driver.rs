use std::process::Command;

use camino::Utf8Path;
use tracing::debug;

use crate::GitError;

/// Runs `git <args>` in `dir`, returning trimmed stdout on success.
///
/// This is the sole place argv is assembled and exit codes are interpreted;
/// every public function in this module goes through it.
pub(crate) fn run(dir: &Utf8Path, args: &[&str]) -> Result<String, GitError> {
    debug!("git {} (in {dir})", args.join(" "));
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .map_err(|e| GitError {
            dir: dir.to_owned(),
            context: format!("failed to spawn `git {}`: {e}", args.join(" ")),
            stderr: String::new(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if output.status.success() {
        Ok(stdout.trim().to_owned())
    } else {
        Err(GitError {
            dir: dir.to_owned(),
            context: format!("`git {}` exited with {}", args.join(" "), output.status),
            stderr,
        })
    }
}

pub fn clone(url: &str, dest: &Utf8Path) -> Result<(), GitError> {
    let parent = dest.parent().unwrap_or(dest);
    fs_err::create_dir_all(parent).map_err(|e| GitError {
        dir: parent.to_owned(),
        context: format!("failed to create clone parent directory: {e}"),
        stderr: String::new(),
    })?;
    run(parent, &["clone", url, dest.as_str()]).map(|_| ())
}

pub fn fetch(dir: &Utf8Path, remote: &str) -> Result<(), GitError> {
    run(dir, &["fetch", remote]).map(|_| ())
}

pub fn fetch_tags(dir: &Utf8Path) -> Result<(), GitError> {
    run(dir, &["fetch", "--tags"]).map(|_| ())
}

pub fn pull(dir: &Utf8Path, branch: &str) -> Result<(), GitError> {
    run(dir, &["pull", "origin", branch]).map(|_| ())
}

pub fn checkout(dir: &Utf8Path, ref_or_sha: &str) -> Result<(), GitError> {
    run(dir, &["checkout", ref_or_sha]).map(|_| ())
}

pub fn checkout_back(dir: &Utf8Path) -> Result<(), GitError> {
    run(dir, &["checkout", "-"]).map(|_| ())
}

pub fn tag(dir: &Utf8Path, name: &str) -> Result<(), GitError> {
    run(dir, &["tag", name]).map(|_| ())
}

pub fn list_tags(dir: &Utf8Path) -> Result<Vec<String>, GitError> {
    let out = run(dir, &["tag", "--list"])?;
    Ok(out.lines().map(str::to_owned).filter(|l| !l.is_empty()).collect())
}

/// Pushes `refname` to `origin`. When `ignore_up_to_date` is set, a remote
/// that already has the ref ("Everything up-to-date") is treated as success
/// rather than as an error, per §4.3's policy on push.
pub fn push(dir: &Utf8Path, refname: &str, ignore_up_to_date: bool) -> Result<(), GitError> {
    match run(dir, &["push", "origin", refname]) {
        Ok(_) => Ok(()),
        Err(e) if ignore_up_to_date && e.stderr.contains("Everything up-to-date") => Ok(()),
        Err(e) => Err(e),
    }
}

pub fn current_branch(dir: &Utf8Path) -> Result<String, GitError> {
    run(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
}

pub fn rev_list_one(dir: &Utf8Path, refname: &str) -> Result<String, GitError> {
    run(dir, &["rev-list", "-n", "1", refname])
}

pub fn status_porcelain(dir: &Utf8Path) -> Result<String, GitError> {
    run(dir, &["status", "--porcelain"])
}

pub fn rev_list_count(dir: &Utf8Path, from_ref: &str, to_ref: &str) -> Result<u64, GitError> {
    let range = format!("{from_ref}..{to_ref}");
    let out = run(dir, &["rev-list", "--count", &range])?;
    out.parse().map_err(|e| GitError {
        dir: dir.to_owned(),
        context: format!("could not parse rev-list --count output `{out}` as a number: {e}"),
        stderr: String::new(),
    })
}

pub fn add(dir: &Utf8Path, paths: &[&str]) -> Result<(), GitError> {
    let mut args = vec!["add"];
    args.extend_from_slice(paths);
    run(dir, &args).map(|_| ())
}

/// Commits staged changes. "nothing to commit" is treated as success,
/// per §7's propagation rule.
pub fn commit(dir: &Utf8Path, message: &str) -> Result<(), GitError> {
    match run(dir, &["commit", "-m", message]) {
        Ok(_) => Ok(()),
        Err(e) if e.stderr.contains("nothing to commit") => Ok(()),
        Err(e) => Err(e),
    }
}

/// Reads a global git config value, used to default a new project's
/// `authors` entry to the user's configured identity.
pub fn config_global(key: &str) -> Result<String, GitError> {
    let cwd = Utf8Path::new(".");
    run(cwd, &["config", "--global", "--get", key])
}
