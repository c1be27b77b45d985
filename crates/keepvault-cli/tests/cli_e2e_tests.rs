//! CLI end-to-end tests that invoke the compiled `keepvault` binary
//! against a temporary vault and a JSON remote store.

use assert_cmd::Command;
use chrono::{DateTime, TimeZone, Utc};
use keepvault_core::{NoteRecord, StoreSnapshot};
use keepvault_test_utils::TestVault;
use predicates::prelude::*;

fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
}

/// Write `notes` as the vault's remote store and return its path argument.
fn seed_remote(vault: &TestVault, notes: Vec<NoteRecord>) -> String {
    let snapshot = StoreSnapshot {
        notes,
        labels: Vec::new(),
    };
    vault.write_file("remote.json", &serde_json::to_string_pretty(&snapshot).unwrap());
    vault.path("remote.json").to_string_lossy().into_owned()
}

fn keepvault(vault: &TestVault) -> Command {
    let mut cmd = Command::cargo_bin("keepvault").unwrap();
    cmd.current_dir(vault.root()).env_remove("RUST_LOG");
    cmd
}

fn remote_notes(vault: &TestVault) -> Vec<NoteRecord> {
    let snapshot: StoreSnapshot = serde_json::from_str(&vault.read("remote.json")).unwrap();
    snapshot.notes
}

#[test]
fn help_mentions_sync() {
    Command::cargo_bin("keepvault")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn version_flag() {
    Command::cargo_bin("keepvault")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("keepvault"));
}

#[test]
fn missing_vault_exits_non_zero() {
    let vault = TestVault::new();
    keepvault(&vault)
        .args(["sync", "--automatic", "--vault", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vault directory not found"));
}

#[test]
fn automatic_sync_pulls_remote_notes() {
    let vault = TestVault::new();
    let remote = seed_remote(
        &vault,
        vec![NoteRecord::text("abc123", "Groceries", "milk\neggs").with_updated(ts(2))],
    );

    keepvault(&vault)
        .args(["sync", "--automatic", "--no-sync-log", "--remote", &remote])
        .assert()
        .success()
        .stdout(predicate::str::contains("Synchronization complete"));

    vault.assert_file_contains("Groceries.md", "id: abc123");
    vault.assert_file_not_exists("_Sync_Log.md");
}

#[test]
fn automatic_sync_pushes_new_files_and_writes_sync_log() {
    let vault = TestVault::new();
    let remote = seed_remote(&vault, Vec::new());
    vault.write_file("Idea.md", "# Idea\nthought\n");

    keepvault(&vault)
        .args(["sync", "--automatic", "--remote", &remote])
        .assert()
        .success();

    let notes = remote_notes(&vault);
    let idea = notes.iter().find(|n| n.title == "Idea").unwrap();
    vault.assert_file_contains("Idea.md", &format!("id: {}", idea.id));
    assert!(notes.iter().any(|n| n.title == "Sync Log" && n.pinned));
    vault.assert_file_contains("_Sync_Log.md", "sync_log");
}

#[test]
fn automatic_conflict_fails_and_names_the_note() {
    let vault = TestVault::new();
    let remote = seed_remote(
        &vault,
        vec![NoteRecord::text("abc123", "Groceries", "milk\neggs").with_updated(ts(2))],
    );
    vault.write_note(
        "Groceries.md",
        &[("id", "abc123"), ("title", "Groceries")],
        "milk\neggs\nbread",
    );
    vault.set_mtime("Groceries.md", ts(2));

    keepvault(&vault)
        .args(["sync", "--automatic", "--no-sync-log", "--remote", &remote])
        .assert()
        .failure()
        .stderr(predicate::str::contains("abc123"))
        .stderr(predicate::str::contains("content"));

    let notes = remote_notes(&vault);
    assert_eq!(notes.len(), 1);
    assert_eq!(
        notes[0].content,
        keepvault_core::NoteContent::Text("milk\neggs".into())
    );
}

#[test]
fn dry_run_json_reports_without_writing() {
    let vault = TestVault::new();
    let remote = seed_remote(
        &vault,
        vec![NoteRecord::text("abc123", "Groceries", "milk\neggs").with_updated(ts(2))],
    );

    let output = keepvault(&vault)
        .args(["sync", "--dry-run", "--json", "--remote", &remote])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["pull"]["created"], 1);
    assert!(
        report["actions"]
            .as_array()
            .unwrap()
            .iter()
            .all(|a| a.as_str().unwrap().starts_with("[dry-run] Would"))
    );
    vault.assert_file_not_exists("Groceries.md");
}

#[test]
fn status_previews_pending_changes() {
    let vault = TestVault::new();
    let remote = seed_remote(
        &vault,
        vec![NoteRecord::text("abc123", "Groceries", "milk\neggs").with_updated(ts(2))],
    );

    keepvault(&vault)
        .args(["status", "--remote", &remote])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault Status"))
        .stdout(predicate::str::contains("[dry-run] Would create"));

    vault.assert_file_not_exists("Groceries.md");
}

#[test]
fn log_file_receives_events() {
    let vault = TestVault::new();
    let remote = seed_remote(&vault, Vec::new());
    let log = vault.path("debug_sync.log");

    keepvault(&vault)
        .args(["--verbose", "--log-file"])
        .arg(&log)
        .args(["sync", "--automatic", "--no-sync-log", "--remote", &remote])
        .assert()
        .success();

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("sync started"), "log was:\n{contents}");
}
