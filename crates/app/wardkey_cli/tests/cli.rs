//! Operator CLI behaviour that needs no database.

use assert_cmd::Command;
use predicates::prelude::*;

fn wardkey() -> Command {
    let mut cmd = Command::cargo_bin("wardkey").expect("wardkey binary");
    cmd.env_remove("DATABASE_URL").env("RUST_LOG", "info");
    cmd
}

#[test]
fn version_prints_package_version() {
    wardkey()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn generate_secret_prints_requested_length() {
    let out = wardkey()
        .args(["generate-secret", "--length", "48"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let secret = String::from_utf8(out).expect("utf8");
    let secret = secret.trim();
    assert_eq!(secret.len(), 48);
    assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn generate_secret_rejects_short_length() {
    wardkey()
        .args(["generate-secret", "--length", "8"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("at least 32"));
}

#[test]
fn provision_without_database_fails() {
    wardkey()
        .args([
            "provision-card",
            "--uid",
            "04:A2:19:7C",
            "--principal-id",
            "0190f5a8-4c1e-7d3a-9b2f-3e4d5c6b7a80",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("DATABASE_URL"));
}

#[test]
fn blank_card_uid_is_rejected_before_connecting() {
    wardkey()
        .args(["deactivate-card", "--uid", "   "])
        .assert()
        .failure()
        .stdout(predicate::str::contains("must not be empty"));
}

#[test]
fn principal_id_must_be_a_uuid() {
    wardkey()
        .args(["deactivate-principal", "--id", "nurse-7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
