use assert_cmd::Command;
use predicates::prelude::*;

fn cosm() -> Command {
    Command::cargo_bin("cosm").unwrap()
}

#[test]
fn version_prints_the_crate_version() {
    cosm()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn status_without_a_project_file_fails_with_a_clear_error() {
    let dir = tempfile::tempdir().unwrap();
    cosm()
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_then_status_reports_the_new_project() {
    let dir = tempfile::tempdir().unwrap();
    cosm()
        .current_dir(dir.path())
        .args(["init", "demo-app", "v0.1.0"])
        .assert()
        .success();
    assert!(dir.path().join("Project.json").exists());

    cosm()
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo-app"))
        .stdout(predicate::str::contains("v0.1.0"));
}

#[test]
fn init_twice_in_the_same_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    cosm()
        .current_dir(dir.path())
        .args(["init", "demo-app"])
        .assert()
        .success();
    cosm()
        .current_dir(dir.path())
        .args(["init", "demo-app"])
        .assert()
        .failure();
}

#[test]
fn status_json_emits_machine_readable_output() {
    let dir = tempfile::tempdir().unwrap();
    cosm()
        .current_dir(dir.path())
        .args(["init", "demo-app", "v2.0.0"])
        .assert()
        .success();

    cosm()
        .current_dir(dir.path())
        .args(["--json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"demo-app\""))
        .stdout(predicate::str::contains("\"version\":\"v2.0.0\""));
}
