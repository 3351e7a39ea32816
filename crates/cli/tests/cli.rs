use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command wired to offline providers and a throwaway database
fn offline_cmd(db_path: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("gentle-post");
    cmd.env("GENTLE_POST__SENTIMENT__PROVIDER", "stub")
        .env("GENTLE_POST__REWRITER__PROVIDER", "stub")
        .env("GENTLE_POST__GENERAL__STATE_DB_PATH", db_path)
        .env_remove("GENTLE_POST_USER");
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn submit(db_path: &Path, user: &str, text: &str) -> Value {
    run_json(
        offline_cmd(db_path)
            .args(["submit", "--user", user, "--text", text, "--json"]),
    )
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    let mut cmd = cargo_bin_cmd!("gentle-post");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("rewrite_fallback = \"reject\""));
    assert!(content.contains("gemini-2.5-flash"));

    let mut again = cargo_bin_cmd!("gentle-post");
    again
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn preview_softens_negative_text() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("posts.sqlite");

    let value = run_json(offline_cmd(&db_path).args([
        "preview",
        "--text",
        "今日は最悪だった",
        "--json",
    ]));

    assert_eq!(value["label"], "negative");
    assert_eq!(value["rewritten"], true);
    assert_eq!(value["transformed_text"], "今日は大変だった");
    assert!(!db_path.exists());
}

#[test]
fn preview_passes_positive_text_through() {
    let dir = TempDir::new().expect("temp dir");

    let value = run_json(offline_cmd(&dir.path().join("posts.sqlite")).args([
        "preview",
        "--text",
        "今日は最高だった",
        "--json",
    ]));

    assert_eq!(value["rewritten"], false);
    assert_eq!(value["transformed_text"], "今日は最高だった");
}

#[test]
fn submit_then_list_and_feed() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("posts.sqlite");

    let negative = submit(&db_path, "alice", "I hate rainy mornings");
    assert_eq!(negative["text"], "I hate rainy mornings");
    assert_eq!(negative["transformed"], "I don't enjoy rainy mornings");
    assert_eq!(negative["label"], "negative");

    submit(&db_path, "bob", "what a great day");

    let mine = run_json(offline_cmd(&db_path).args(["list", "--user", "alice", "--json"]));
    let mine = mine.as_array().expect("array");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], negative["id"]);

    let feed = run_json(offline_cmd(&db_path).args(["feed", "--order", "oldest", "--json"]));
    let owners: Vec<&str> = feed
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["owner"].as_str().expect("owner"))
        .collect();
    assert_eq!(owners, vec!["alice", "bob"]);
}

#[test]
fn submit_attachment_only_stores_no_classification() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("posts.sqlite");

    let value = run_json(offline_cmd(&db_path).args([
        "submit",
        "--user",
        "alice",
        "--attachment",
        "sunset.jpg",
        "--json",
    ]));

    assert_eq!(value["attachment"], "sunset.jpg");
    assert!(value["text"].is_null());
    assert!(value["transformed"].is_null());
    assert!(value["label"].is_null());
    assert!(value["score"].is_null());
}

#[test]
fn submit_without_text_or_attachment_fails() {
    let dir = TempDir::new().expect("temp dir");

    offline_cmd(&dir.path().join("posts.sqlite"))
        .args(["submit", "--user", "alice", "--text", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to post"));
}

#[test]
fn edit_and_delete_require_ownership() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("posts.sqlite");

    let created = submit(&db_path, "alice", "good morning");
    let id = created["id"].as_str().expect("id").to_string();

    offline_cmd(&db_path)
        .args(["edit", &id, "--user", "bob", "--text", "mine now"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only change your own posts"));

    let edited = run_json(offline_cmd(&db_path).args([
        "edit",
        &id,
        "--user",
        "alice",
        "--text",
        "this is the worst",
        "--json",
    ]));
    assert_eq!(edited["transformed"], "this is the hardest");
    assert_eq!(edited["created_at"], created["created_at"]);

    offline_cmd(&db_path)
        .args(["delete", &id, "--user", "bob"])
        .assert()
        .failure();

    offline_cmd(&db_path)
        .args(["delete", &id, "--user", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()));

    let feed = run_json(offline_cmd(&db_path).args(["feed", "--json"]));
    assert_eq!(feed, serde_json::json!([]));
}

#[test]
fn doctor_reports_ok_for_offline_setup() {
    let dir = TempDir::new().expect("temp dir");

    let value = run_json(offline_cmd(&dir.path().join("posts.sqlite")).args(["doctor", "--json"]));

    assert_eq!(value["overall"], "ok");
    assert_eq!(value["rewriter"]["status"], "ok");
}
