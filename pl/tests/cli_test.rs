//! Command-line tests for the `pl` binary
//!
//! Each test runs in its own temp dir with logging, config lookup and the
//! library redirected there.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use promptstore::{LibraryStore, NewPrompt};
use tempfile::TempDir;

fn pl(temp: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pl").expect("Failed to find pl binary");
    cmd.current_dir(temp)
        .env("XDG_DATA_HOME", temp.join("data"))
        .env("XDG_CONFIG_HOME", temp.join("config"))
        .env("NO_COLOR", "1")
        .env_remove("GEMINI_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY");
    cmd
}

/// Write a config pointing the library at `<temp>/library` for `user`
fn write_config(temp: &Path, user: &str) -> PathBuf {
    let path = temp.join("promptly.yml");
    let yaml = format!(
        "log-level: debug\nlibrary:\n  store-path: {}\n  user: {}\n",
        temp.join("library").display(),
        user
    );
    fs::write(&path, yaml).expect("Failed to write config");
    path
}

/// Seed the library with one prompt and one template, returning their ids
fn seed_library(temp: &Path, user: &str) -> (String, String) {
    let mut store = LibraryStore::open(temp.join("library")).expect("Failed to open store");
    store.init_user(user).expect("Failed to init user");
    let prompt = store
        .add_prompt(
            NewPrompt::named("Code reviewer")
                .with_section("role", "Senior Rust reviewer")
                .with_section("task", "Review the diff"),
        )
        .expect("Failed to add prompt")
        .expect("No active user");
    let template = store
        .add_template(
            NewPrompt::named("Output template")
                .with_section("task", "Summarize findings")
                .with_section("output", "Bullet list"),
        )
        .expect("Failed to add template")
        .expect("No active user");
    (prompt, template)
}

// =============================================================================
// Detection and Classification
// =============================================================================

#[test]
fn test_detect_from_file() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let msg = temp.path().join("reply.txt");
    fs::write(&msg, "## Section 2: Context\n\n```\nA small startup\n```\n").unwrap();

    pl(temp.path())
        .arg("detect")
        .arg(&msg)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""key": "context""#))
        .stdout(predicate::str::contains(r#""proposed-content": "A small startup""#))
        .stdout(predicate::str::contains(r#""pattern": "header""#));
}

#[test]
fn test_detect_from_stdin_without_match() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    pl(temp.path())
        .arg("detect")
        .write_stdin("Just chatting, nothing to see here.")
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn test_confirm() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    pl(temp.path())
        .args(["confirm", "Looks good, thanks!"])
        .assert()
        .success()
        .stdout("true\n");

    pl(temp.path())
        .args(["confirm", "goodbye"])
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn test_techniques_json() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    let output = pl(temp.path()).args(["techniques", "--json"]).output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let techniques = value.as_array().unwrap();
    assert!(techniques.iter().any(|t| t["name"] == "TACO"));
    let taco = techniques.iter().find(|t| t["id"] == "taco").unwrap();
    assert_eq!(taco["sections"][0]["key"], "task");
    assert_eq!(taco["sections"][0]["required"], true);
}

#[test]
fn test_infer() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    pl(temp.path())
        .args(["infer", "task", "actor", "context"])
        .assert()
        .success()
        .stdout("TACO\n");

    pl(temp.path())
        .args(["infer", "task", "actor", "tone"])
        .assert()
        .success()
        .stdout("Custom TACO\n");
}

#[test]
fn test_no_subcommand_prints_help() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    pl(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

// =============================================================================
// Library Commands
// =============================================================================

#[test]
fn test_library_requires_user() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    pl(temp.path())
        .args(["library", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No library user"));
}

#[test]
fn test_library_list_and_search() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp.path(), "alice");
    seed_library(temp.path(), "alice");

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Code reviewer"))
        .stdout(predicate::str::contains("Output template").not());

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "list", "--templates"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Output template"));

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "list", "--search", "haiku"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries."));
}

#[test]
fn test_library_show_and_copy() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp.path(), "alice");
    let (prompt, _) = seed_library(temp.path(), "alice");

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "show", &prompt])
        .assert()
        .success()
        .stdout(predicate::str::contains("Code reviewer"))
        .stdout(predicate::str::contains("[Role]\nSenior Rust reviewer"));

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "copy", &prompt])
        .assert()
        .success()
        .stdout("[Role]\nSenior Rust reviewer\n\n[Task]\nReview the diff\n");
}

#[test]
fn test_library_delete() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp.path(), "alice");
    let (prompt, template) = seed_library(temp.path(), "alice");

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "delete", &template])
        .assert()
        .success();

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "delete", &template])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));

    let mut store = LibraryStore::open(temp.path().join("library")).unwrap();
    store.init_user("alice").unwrap();
    assert!(store.templates().is_empty());
    assert!(store.get_prompt(&prompt).is_some());
}

#[test]
fn test_library_mix_print_and_save() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp.path(), "alice");
    let (prompt, template) = seed_library(temp.path(), "alice");

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "mix", &format!("{}:role", prompt), &format!("{}:output", template)])
        .assert()
        .success()
        .stdout("[Role]\nSenior Rust reviewer\n\n[Output]\nBullet list\n");

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "mix", &format!("{}:task", prompt), &format!("{}:task", template)])
        .args(["--save-as", "Merged"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Saved mix as "));

    let mut store = LibraryStore::open(temp.path().join("library")).unwrap();
    store.init_user("alice").unwrap();
    let merged = store.saved_prompts().iter().find(|p| p.name == "Merged").unwrap();
    assert_eq!(merged.section("task"), Some("Review the diff\n\nSummarize findings"));
}

#[test]
fn test_library_mix_with_nothing_selected_fails() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(temp.path(), "alice");
    seed_library(temp.path(), "alice");

    pl(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["library", "mix", "missing:role"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to mix"));
}
