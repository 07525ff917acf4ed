use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use cosm_depot::{Depot, StdinPrompter};
use cosm_project::ReleaseSelector;
use cosm_registry::RegistryEngine;

use crate::args::{Command, RegistryCommand};
use crate::confirm::{Confirmer, StdinConfirmer};

fn workdir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().context("could not determine the current directory")?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|p| anyhow::anyhow!("current directory is not valid UTF-8: {p:?}"))
}

fn open_depot() -> Result<Depot> {
    let mut prompter = StdinPrompter;
    cosm_depot::locate_or_init(&mut prompter, false).context("could not locate or initialize the depot")
}

pub fn run(command: Command, json: bool) -> Result<()> {
    match command {
        Command::Version => {
            println!("cosm {}", env!("CARGO_PKG_VERSION"));
        }
        Command::Status => status(json)?,
        Command::Activate => activate(json)?,
        Command::Init { name, version, language } => {
            cosm_project::init(&workdir()?, &name, version, language).context("init failed")?;
            println!("initialized {name}");
        }
        Command::Add { name, version, registries } => add(&name, version, registries)?,
        Command::Rm { name, bucket } => rm(&name, bucket.as_deref())?,
        Command::Release { version, patch, minor, major } => {
            let selector = match version {
                Some(v) => ReleaseSelector::Explicit(v),
                None if patch => ReleaseSelector::Patch,
                None if minor => ReleaseSelector::Minor,
                None if major => ReleaseSelector::Major,
                None => anyhow::bail!("specify a version, or one of --patch/--minor/--major"),
            };
            let released = cosm_project::release(&workdir()?, selector).context("release failed")?;
            println!("released {released}");
        }
        Command::Registry { command } => registry(command, &mut StdinConfirmer)?,
    }
    Ok(())
}

fn status(json: bool) -> Result<()> {
    let project = cosm_fs::load_project(&cosm_fs::paths::project_file(&workdir()?)).context("status failed")?;
    if json {
        let summary = serde_json::json!({
            "name": project.name,
            "version": project.version.to_string(),
            "dependencies": project.deps.len(),
        });
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("{} {} ({} dependencies)", project.name, project.version, project.deps.len());
    }
    Ok(())
}

fn activate(json: bool) -> Result<()> {
    let workdir = workdir()?;
    let depot = cosm_depot::locate().context("activation requires an initialized depot")?;
    let outcome = cosm_activate::activate(&workdir, &depot).context("activate failed")?;
    if json {
        let rebuilt = matches!(outcome, cosm_activate::ActivationOutcome::Rebuilt);
        println!("{}", serde_json::json!({ "rebuilt": rebuilt }));
    } else {
        match outcome {
            cosm_activate::ActivationOutcome::Rebuilt => println!("activated (build list rebuilt)"),
            cosm_activate::ActivationOutcome::UpToDate => println!("activated (build list up to date)"),
        }
    }
    Ok(())
}

fn add(name: &str, version: Option<cosm_semver::SemVer>, registries: Vec<String>) -> Result<()> {
    let depot = open_depot()?;
    let workdir = workdir()?;
    let registries = if registries.is_empty() { depot.registry_names()? } else { registries };

    match cosm_project::add_dep(&workdir, &depot, &registries, name, version)? {
        cosm_project::AddDepOutcome::Added { name, version } => println!("added {name}@{version}"),
        cosm_project::AddDepOutcome::Ambiguous(locations) => {
            println!("`{name}` is ambiguous across {} registries:", locations.len());
            for location in &locations {
                println!(
                    "  {} -> {}@{} ({})",
                    location.registry_name, location.specs.name, location.specs.version, location.specs.uuid
                );
            }
            anyhow::bail!("re-run with --registry to pick one");
        }
    }
    Ok(())
}

fn rm(name: &str, bucket: Option<&str>) -> Result<()> {
    let workdir = workdir()?;

    if let Some(key) = bucket {
        cosm_project::rm_dep_by_bucket(&workdir, key).context("rm failed")?;
        println!("removed {key}");
        return Ok(());
    }

    match cosm_project::rm_dep(&workdir, name)? {
        cosm_project::RmDepOutcome::Removed { bucket_key } => println!("removed {bucket_key}"),
        cosm_project::RmDepOutcome::Ambiguous(candidates) => {
            println!("`{name}` matches {} entries:", candidates.len());
            for (key, entry) in &candidates {
                println!("  {key} -> {}@{}", entry.name, entry.version);
            }
            anyhow::bail!("multiple dependencies named `{name}`; re-run with --bucket <key> to pick one");
        }
    }
    Ok(())
}

fn registry(command: RegistryCommand, confirmer: &mut dyn Confirmer) -> Result<()> {
    let depot = open_depot()?;
    registry_command(&depot, command, confirmer)
}

fn registry_command(depot: &Depot, command: RegistryCommand, confirmer: &mut dyn Confirmer) -> Result<()> {
    let engine = RegistryEngine::new(depot);
    match command {
        RegistryCommand::Init { name, giturl } => {
            engine.init(&name, &giturl).context("registry init failed")?;
            println!("initialized registry {name}");
        }
        RegistryCommand::Clone { giturl } => {
            let name = engine.clone(&giturl).context("registry clone failed")?;
            println!("cloned registry {name}");
        }
        RegistryCommand::Delete { name, force } => {
            if !force {
                anyhow::bail!("refusing to delete registry `{name}` without --force");
            }
            engine.delete(&name).context("registry delete failed")?;
            println!("deleted registry {name}");
        }
        RegistryCommand::Update { name, all } => match (name, all) {
            (Some(name), false) => {
                engine.update_one(&name).context("registry update failed")?;
                println!("updated registry {name}");
            }
            (None, true) => {
                let results = engine.update_all()?;
                let mut failed = false;
                for (name, outcome) in results {
                    match outcome {
                        Ok(()) => println!("updated registry {name}"),
                        Err(e) => {
                            failed = true;
                            eprintln!("Error: registry {name} failed to update: {e}");
                        }
                    }
                }
                if failed {
                    anyhow::bail!("one or more registries failed to update");
                }
            }
            _ => anyhow::bail!("specify either a registry name or --all, not both"),
        },
        RegistryCommand::Add { registry, target, version } => match version {
            Some(version) => {
                engine.add_version(&registry, &target, version).context("registry add failed")?;
                println!("added {target}@{version} to registry {registry}");
            }
            None => {
                engine.add_new_package(&registry, &target).context("registry add failed")?;
                println!("registered a new package from {target} in registry {registry}");
            }
        },
        RegistryCommand::Rm { registry, package, version, force } => {
            let target = match version {
                Some(v) => format!("{package}@{v}"),
                None => format!("all of {package}"),
            };
            if !force && !confirmer.confirm(&format!("remove {target} from registry `{registry}`?"))? {
                return Err(cosm_core::Error::UserCancelled.into());
            }
            engine.rm(&registry, &package, version).context("registry rm failed")?;
            println!("removed {target} from registry {registry}");
        }
        RegistryCommand::Status { name } => registry_status(depot, &name)?,
    }
    Ok(())
}

/// Read-only summary of one registry's package/version counts and working
/// copy cleanliness (supplemented per §6's CLI surface table).
fn registry_status(depot: &Depot, name: &str) -> Result<()> {
    let registry = cosm_fs::load_registry(&depot.registry_file(name)).context("registry status failed")?;
    let repo = cosm_git::Repo::new(depot.registry_dir(name));
    let clean = repo.is_clean().context("could not read registry working copy status")?;

    let mut version_count = 0usize;
    for package_name in registry.packages.keys() {
        let path = cosm_fs::paths::versions_file(depot.root(), name, package_name);
        if let Ok(versions) = cosm_fs::load_versions(&path) {
            version_count += versions.len();
        }
    }

    println!(
        "{name}: {} packages, {version_count} versions, working copy {}",
        registry.packages.len(),
        if clean { "clean" } else { "dirty" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::FixedConfirmer;
    use cosm_core::Project;
    use cosm_semver::SemVer;
    use cosm_test_support::{TestDepot, TestRepo};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn published_package(depot: &TestDepot) -> (TestRepo, &'static str) {
        let remote = TestRepo::init_bare_remote();
        let engine = RegistryEngine::new(&depot.depot);
        engine.init("main", &remote.url()).unwrap();

        let source = TestRepo::init();
        let project = Project {
            name: "left-pad".into(),
            uuid: Uuid::new_v4(),
            authors: vec!["[test]test@cosm.local".into()],
            language: None,
            version: SemVer::new(0, 1, 0),
            deps: BTreeMap::new(),
        };
        source.write_project(&project);
        source.repo.add(&["."]).unwrap();
        source.repo.commit("add Project.json").unwrap();
        source.repo.tag("v1.0.0").unwrap();

        engine.add_new_package("main", &source.url()).unwrap();
        (remote, "left-pad")
    }

    #[test]
    fn registry_rm_without_force_is_cancelled_when_the_user_declines() {
        let depot = TestDepot::new();
        let (_remote, name) = published_package(&depot);

        let command = RegistryCommand::Rm {
            registry: "main".into(),
            package: name.into(),
            version: None,
            force: false,
        };
        let err = registry_command(&depot.depot, command, &mut FixedConfirmer(false)).unwrap_err();
        assert!(err.downcast_ref::<cosm_core::Error>().is_some_and(|e| matches!(e, cosm_core::Error::UserCancelled)));

        let registry = cosm_fs::load_registry(&depot.depot.registry_file("main")).unwrap();
        assert!(registry.packages.contains_key(name), "declining the prompt must not remove the package");
    }

    #[test]
    fn registry_rm_without_force_proceeds_when_the_user_confirms() {
        let depot = TestDepot::new();
        let (_remote, name) = published_package(&depot);

        let command = RegistryCommand::Rm {
            registry: "main".into(),
            package: name.into(),
            version: None,
            force: false,
        };
        registry_command(&depot.depot, command, &mut FixedConfirmer(true)).unwrap();

        let registry = cosm_fs::load_registry(&depot.depot.registry_file("main")).unwrap();
        assert!(!registry.packages.contains_key(name));
    }

    #[test]
    fn registry_rm_with_force_skips_the_prompt() {
        let depot = TestDepot::new();
        let (_remote, name) = published_package(&depot);

        let command = RegistryCommand::Rm {
            registry: "main".into(),
            package: name.into(),
            version: None,
            force: true,
        };
        // A confirmer that always declines must not be consulted when
        // `--force` is set.
        registry_command(&depot.depot, command, &mut FixedConfirmer(false)).unwrap();

        let registry = cosm_fs::load_registry(&depot.depot.registry_file("main")).unwrap();
        assert!(!registry.packages.contains_key(name));
    }
}
