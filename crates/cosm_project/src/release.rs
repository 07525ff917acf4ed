use camino::Utf8Path;
use cosm_core::{Error, Result};
use cosm_git::Repo;
use cosm_semver::SemVer;
use tracing::info;

/// The requested new version for `release` (§4.6).
#[derive(Debug, Clone, Copy)]
pub enum ReleaseSelector {
    Explicit(SemVer),
    Patch,
    Minor,
    Major,
}

/// Requires a clean working tree and a local branch not behind origin,
/// computes the new version, and on success tags and pushes it.
///
/// A requested version equal to the current one is allowed as an
/// idempotent retag as long as the tag does not already exist locally
/// (§9: preserved from the source this was distilled from).
pub fn release(workdir: &Utf8Path, selector: ReleaseSelector) -> Result<SemVer> {
    let path = cosm_fs::paths::project_file(workdir);
    let mut project = cosm_fs::load_project(&path)?;
    let repo = Repo::new(workdir.to_owned());

    if !repo.is_clean()? {
        return Err(Error::RepoState("working tree has uncommitted changes".into()));
    }
    let branch = repo.current_branch()?;
    if repo.commits_behind(&branch)? > 0 {
        return Err(Error::RepoState(format!("local branch is behind origin/{branch}")));
    }

    let current = project.version;
    let new_version = match selector {
        ReleaseSelector::Explicit(v) => v,
        ReleaseSelector::Patch => current.bump_patch(),
        ReleaseSelector::Minor => current.bump_minor(),
        ReleaseSelector::Major => current.bump_major(),
    };

    if new_version < current {
        return Err(Error::VersionOrder(format!(
            "requested version {new_version} is not >= current version {current}"
        )));
    }
    let tag = new_version.to_string();
    if repo.tag_exists(&tag)? {
        return Err(Error::AlreadyExists(format!("tag {tag} already exists")));
    }

    if new_version != current {
        project.version = new_version;
        cosm_fs::save_project(&path, &project)?;
        repo.add(&["Project.json"])?;
        repo.commit(&format!("Release {new_version}"))?;
    }

    repo.tag(&tag)?;
    repo.push(&branch, true)?;
    repo.push(&tag, true)?;
    info!("released {tag}");
    Ok(new_version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosm_core::Project;
    use cosm_test_support::TestRepo;
    use uuid::Uuid;

    fn project_repo(version: SemVer) -> TestRepo {
        let repo = TestRepo::init();
        let project = Project {
            name: "app".into(),
            uuid: Uuid::new_v4(),
            authors: vec![],
            language: None,
            version,
            deps: Default::default(),
        };
        repo.write_project(&project);
        repo.repo.add(&["."]).unwrap();
        repo.repo.commit("add Project.json").unwrap();
        repo
    }

    #[test]
    fn patch_minor_major_bump_as_expected() {
        for (selector, expected) in [
            (ReleaseSelector::Patch, SemVer::new(1, 2, 4)),
            (ReleaseSelector::Minor, SemVer::new(1, 3, 0)),
            (ReleaseSelector::Major, SemVer::new(2, 0, 0)),
        ] {
            let repo = project_repo(SemVer::new(1, 2, 3));
            let new_version = release(&repo.path, selector).unwrap();
            assert_eq!(new_version, expected);
        }
    }

    #[test]
    fn releasing_the_current_version_retags_when_absent() {
        let repo = project_repo(SemVer::new(1, 0, 0));
        let new_version = release(&repo.path, ReleaseSelector::Explicit(SemVer::new(1, 0, 0))).unwrap();
        assert_eq!(new_version, SemVer::new(1, 0, 0));
        assert!(repo.repo.tag_exists("v1.0.0").unwrap());
    }

    #[test]
    fn releasing_an_existing_tag_fails() {
        let repo = project_repo(SemVer::new(1, 0, 0));
        release(&repo.path, ReleaseSelector::Explicit(SemVer::new(1, 0, 0))).unwrap();
        let err = release(&repo.path, ReleaseSelector::Explicit(SemVer::new(1, 0, 0))).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn releasing_a_lower_version_is_a_version_order_error() {
        let repo = project_repo(SemVer::new(1, 2, 0));
        let err = release(&repo.path, ReleaseSelector::Explicit(SemVer::new(1, 1, 0))).unwrap_err();
        assert!(matches!(err, Error::VersionOrder(_)));
    }

    #[test]
    fn dirty_working_tree_refuses_to_release() {
        let repo = project_repo(SemVer::new(1, 0, 0));
        fs_err::write(repo.path.join("untracked.txt"), b"x").unwrap();
        let err = release(&repo.path, ReleaseSelector::Patch).unwrap_err();
        assert!(matches!(err, Error::RepoState(_)));
    }
}
