#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn zero_avatar_run(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("avatargen").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("RUST_LOG")
        .args(["-n", "0"]);
    cmd
}

#[test]
fn test_verbose_flag_enables_debug_logging() {
    let home = TempDir::new().unwrap();
    zero_avatar_run(&home)
        .arg("--verbose")
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn test_short_verbose_flag_works() {
    let home = TempDir::new().unwrap();
    zero_avatar_run(&home)
        .arg("-v")
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn test_default_mode_shows_only_info() {
    let home = TempDir::new().unwrap();
    zero_avatar_run(&home)
        .assert()
        .success()
        .stdout(predicate::str::contains("DEBUG").not())
        .stderr(predicate::str::contains("DEBUG").not())
        .stderr(predicate::str::contains("INFO"));
}

#[test]
fn test_logs_stay_off_stdout() {
    let home = TempDir::new().unwrap();
    zero_avatar_run(&home)
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("INFO").not())
        .stdout(predicate::str::contains("Generated: 0, Failed: 0"));
}
