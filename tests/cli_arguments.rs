//! Argument handling of the oc-auth binary.

use predicates::prelude::*;

mod common;
use common::TestHome;

#[test]
fn test_missing_username_exits_with_usage_error() {
    let home = TestHome::new();
    home.command()
        .args(["--password", "secret"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--username"));
}

#[test]
fn test_missing_password_exits_with_usage_error() {
    let home = TestHome::new();
    home.command().args(["-u", "developer"]).assert().code(2).stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let home = TestHome::new();
    home.command().args(["-u", "a", "-p", "b", "--verbose", "--quiet"]).assert().code(2);
}

#[test]
fn test_version() {
    let home = TestHome::new();
    home.command()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_flags() {
    let home = TestHome::new();
    home.command().arg("--help").assert().success().stdout(
        predicate::str::contains("--context")
            .and(predicate::str::contains("--cluster"))
            .and(predicate::str::contains("--credential"))
            .and(predicate::str::contains("--insecure")),
    );
}
