//! CLI surface tests: argument validation and error reporting.

use assert_cmd::Command;
use predicates::prelude::*;

fn playship() -> Command {
    let mut cmd = Command::cargo_bin("playship").expect("binary should build");
    cmd.env_remove("PLAY_API_TOKEN");
    cmd
}

#[test]
fn test_help_lists_usage() {
    playship()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--track"))
        .stdout(predicate::str::contains("--rollout"));
}

#[test]
fn test_requires_token() {
    playship()
        .arg("app.apk")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--token"));
}

#[test]
fn test_rejects_out_of_range_rollout() {
    playship()
        .args(["--token", "t", "--rollout", "250", "app.apk"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("rollout"));
}

#[test]
fn test_rejects_invalid_release_notes_language() {
    playship()
        .args(["--token", "t", "--release-notes", "english=notes.txt", "app.apk"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("language tag"));
}

#[test]
fn test_unreadable_apk_is_a_fatal_error() {
    playship()
        .args(["--token", "t", "/does/not/exist.apk"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Upload failed"));
}
