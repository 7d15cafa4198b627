use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    cargo_bin_cmd!("uplink")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--base-url"));
}

#[test]
fn test_watch_help_lists_credential_flags() {
    cargo_bin_cmd!("uplink")
        .args(["watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--username"))
        .stdout(predicate::str::contains("--key"));
}

#[test]
fn test_unknown_subcommand_fails() {
    cargo_bin_cmd!("uplink")
        .arg("frobnicate")
        .assert()
        .failure();
}
