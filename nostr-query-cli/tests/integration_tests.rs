use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("nostr-query").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Query Nostr relays"))
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("by-author"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("nostr-query").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("nostr-query"));
}

#[test]
fn test_query_help() {
    let mut cmd = Command::cargo_bin("nostr-query").unwrap();
    cmd.arg("query").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--kind"))
        .stdout(predicate::str::contains("--author"))
        .stdout(predicate::str::contains("--follow"))
        .stdout(predicate::str::contains("--relay"));
}

#[test]
fn test_by_author_requires_author() {
    let mut cmd = Command::cargo_bin("nostr-query").unwrap();
    cmd.arg("by-author").arg("--kind").arg("1");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--author"));
}

#[test]
fn test_invalid_author_fails_before_connecting() {
    let mut cmd = Command::cargo_bin("nostr-query").unwrap();
    cmd.arg("query")
        .arg("--author")
        .arg("definitely-not-a-key")
        .arg("--relay")
        .arg("wss://relay.invalid")
        .arg("--no-progress");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid public key"));
}

#[test]
fn test_invalid_relay_url() {
    let mut cmd = Command::cargo_bin("nostr-query").unwrap();
    cmd.arg("relays")
        .arg("--author")
        .arg("0000000000000000000000000000000000000000000000000000000000000001")
        .arg("--relay")
        .arg("https://relay.invalid");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("ws:// or wss://"));
}

#[test]
fn test_since_after_until() {
    let mut cmd = Command::cargo_bin("nostr-query").unwrap();
    cmd.arg("query")
        .arg("--since")
        .arg("200")
        .arg("--until")
        .arg("100")
        .arg("--relay")
        .arg("wss://relay.invalid");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("is after --until"));
}

#[test]
fn test_missing_config_file() {
    let mut cmd = Command::cargo_bin("nostr-query").unwrap();
    cmd.arg("--config")
        .arg("/nonexistent/nostr-query.toml")
        .arg("query");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_malformed_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nostr-query.toml");
    fs::write(&config_path, "[[relays]]\nurl = \"ftp://wrong.example\"\n").unwrap();

    let mut cmd = Command::cargo_bin("nostr-query").unwrap();
    cmd.arg("--config").arg(&config_path).arg("query");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}
