use assert_cmd::Command;
use predicates::prelude::*;

fn workerflow() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("workerflow"));
    for var in [
        "PLUGIN_NAMESPACE",
        "PLUGIN_REGISTRY_DOCKERHUB",
        "PLUGIN_REGISTRY_HARBOR",
        "PLUGIN_STABLE",
        "PLUGIN_FORCE",
        "PLUGIN_WORKER_PATH",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_cli_help() {
    workerflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--namespace"))
        .stdout(predicate::str::contains("--registry-dockerhub"))
        .stdout(predicate::str::contains("--registry-harbor"))
        .stdout(predicate::str::contains("PLUGIN_WORKER_PATH"));
}

#[test]
fn test_cli_version() {
    workerflow()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("workerflow"));
}

#[test]
fn test_missing_namespace_is_a_usage_error() {
    workerflow()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--namespace"));
}

#[test]
fn test_malformed_credentials_fail_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("analyzers")).unwrap();

    workerflow()
        .args(["-n", "acme", "--base-path"])
        .arg(dir.path())
        .args(["--registry-harbor", "ci-bot:hunter2-harbor.example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid harbor registry"))
        .stderr(predicate::str::contains("missing '@'"))
        .stderr(predicate::str::contains("hunter2").not())
        .stderr(predicate::str::contains("Docker").not());
}

#[test]
fn test_malformed_credentials_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("analyzers")).unwrap();

    workerflow()
        .env("PLUGIN_NAMESPACE", "acme")
        .env("PLUGIN_REGISTRY_DOCKERHUB", "missing-colon@docker.io")
        .arg("--base-path")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid dockerhub registry"))
        .stderr(predicate::str::contains("missing ':'"));
}

#[test]
fn test_missing_worker_root_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();

    workerflow()
        .args(["-n", "acme", "--base-path"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to resolve workers"));
}
