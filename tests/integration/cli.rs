//! Smoke tests for the `useful` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use useful::test_utils::ConfigFixture;

fn useful() -> Command {
    let mut cmd = Command::cargo_bin("useful").unwrap();
    cmd.env_remove("USEFUL_LOG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_load_prints_json() {
    let fixture = ConfigFixture::new().unwrap();
    let uri = fixture
        .write("app.yaml", "base: &b {retries: 3}\nsvc: *b\nport: <port>\n")
        .unwrap();

    useful()
        .args(["load", &uri, "--set", "port=9000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"retries\": 3"))
        .stdout(predicate::str::contains("\"port\": 9000"));
}

#[test]
fn test_load_yaml_output() {
    let fixture = ConfigFixture::new().unwrap();
    let uri = fixture.write("app.json", r#"{"name": "svc"}"#).unwrap();

    useful()
        .args(["-q", "load", &uri, "--output", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::diff("name: svc\n"));
}

#[test]
fn test_flatten() {
    let fixture = ConfigFixture::new().unwrap();
    let uri = fixture.write("app.json", r#"{"db": {"hosts": ["a"]}}"#).unwrap();

    useful()
        .args(["flatten", &uri])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"db.hosts.0\": \"a\""));
}

#[test]
fn test_unsupported_scheme_fails() {
    useful()
        .args(["load", "s3://bucket/app.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_missing_file_fails() {
    let fixture = ConfigFixture::new().unwrap();
    let missing = fixture.file("absent.json");

    useful()
        .args(["load", &missing.to_string_lossy()])
        .assert()
        .failure();
}
