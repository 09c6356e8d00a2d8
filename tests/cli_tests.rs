//! Exit codes and output of the c8run binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn c8run(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("c8run").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("JAVA_HOME")
        .env_remove("JAVA_VERSION")
        .env_remove("JAVA_OPTS")
        .env_remove("CAMUNDA_VERSION");
    cmd
}

#[test]
fn test_help_exits_zero() {
    let dir = TempDir::new().unwrap();
    c8run(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--detached"));
}

#[test]
fn test_unknown_verb_prints_help_and_fails() {
    let dir = TempDir::new().unwrap();
    c8run(&dir)
        .arg("restart")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("USAGE"));
}

#[test]
fn test_unknown_flag_prints_help_and_fails() {
    let dir = TempDir::new().unwrap();
    c8run(&dir)
        .args(["start", "--verbose"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("USAGE"))
        .stderr(predicate::str::contains("--verbose"));
}

#[test]
fn test_dangling_config_prints_help_and_fails() {
    let dir = TempDir::new().unwrap();
    c8run(&dir)
        .args(["start", "--detached", "--config"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("USAGE"));
}

#[test]
fn test_package_is_not_supported() {
    let dir = TempDir::new().unwrap();
    c8run(&dir)
        .arg("package")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Command: package"))
        .stderr(predicate::str::contains("Unsupported command"));
}

#[test]
fn test_stop_without_pid_files_succeeds() {
    let dir = TempDir::new().unwrap();
    c8run(&dir)
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("Elasticsearch is stopped."))
        .stdout(predicate::str::contains("Camunda is stopped."));
}

#[test]
fn test_start_with_old_java_fails_before_spawning() {
    let dir = TempDir::new().unwrap();
    let bin = dir.path().join("jdk").join("bin");
    fs::create_dir_all(&bin).unwrap();
    fs::write(bin.join("java"), "").unwrap();

    c8run(&dir)
        .args(["start", "--detached"])
        .env("JAVA_HOME", dir.path().join("jdk"))
        .env("JAVA_VERSION", "17.0.9")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("at least JDK 21"));

    for name in ["elasticsearch.pid", "connectors.pid", "camunda.pid"] {
        assert!(!dir.path().join(name).exists());
    }
}

#[test]
fn test_start_with_bad_java_home_fails() {
    let dir = TempDir::new().unwrap();
    c8run(&dir)
        .arg("start")
        .env("JAVA_HOME", dir.path().join("missing"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to find JAVA_HOME or java program."));
}

#[test]
fn test_clean_removes_logs() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("log")).unwrap();
    fs::write(dir.path().join("log").join("connectors.log"), "x").unwrap();

    c8run(&dir).arg("clean").assert().success();

    assert!(!dir.path().join("log").join("connectors.log").exists());
}
