//! CLI tests for the nxos-igmp binary

use assert_cmd::Command;
use predicates::prelude::*;

fn nxos_igmp() -> Command {
    let mut cmd = Command::cargo_bin("nxos-igmp").unwrap();
    cmd.env_remove("NXOS_HOST")
        .env_remove("NXOS_USERNAME")
        .env_remove("NXOS_PASSWORD")
        .env_remove("NXOS_IGMP_CONFIG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help() {
    nxos_igmp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--flush-routes"))
        .stdout(predicate::str::contains("--enforce-rtr-alert"))
        .stdout(predicate::str::contains("--restart"));
}

#[test]
fn test_version() {
    nxos_igmp()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_host_is_required() {
    nxos_igmp()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--host"));
}

#[test]
fn test_invalid_protocol() {
    nxos_igmp()
        .args(["--host", "switch1", "--protocol", "telnet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("telnet"));
}

#[test]
fn test_unresolvable_host_exit_code() {
    nxos_igmp()
        .args([
            "--host",
            "nxos-igmp.invalid",
            "--username",
            "admin",
            "--password",
            "admin",
            "--output",
            "json",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("\"failed\":true"));
}

#[test]
fn test_missing_config_file_is_a_warning() {
    nxos_igmp()
        .args([
            "--host",
            "nxos-igmp.invalid",
            "--username",
            "admin",
            "--password",
            "admin",
            "--config",
            "/nonexistent/nxos-igmp.toml",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to load config"));
}
