use std::fs;

use keepvault_fs::{Error, NormalizedPath, VaultLayout};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn touch(root: &std::path::Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "---\n---\n").unwrap();
}

fn relative(layout: &VaultLayout, paths: &[NormalizedPath]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.relative_to(layout.root()).unwrap().to_string())
        .collect()
}

#[test]
fn open_missing_vault_fails() {
    let temp = TempDir::new().unwrap();
    let err = VaultLayout::open(temp.path().join("nope")).unwrap_err();
    assert!(matches!(err, Error::VaultNotFound { .. }));
}

#[test]
fn scan_finds_notes_recursively_and_skips_ignored_dirs() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "b.md");
    touch(temp.path(), "a.md");
    touch(temp.path(), "Archived/old.md");
    touch(temp.path(), "Trashed/bin.MD");
    touch(temp.path(), "Attachments/readme.md");
    touch(temp.path(), ".obsidian/workspace.md");
    touch(temp.path(), ".keepvault/notes.md");
    touch(temp.path(), "image.png");

    let layout = VaultLayout::open(temp.path()).unwrap();
    let found = layout.scan_markdown().unwrap();

    assert_eq!(
        relative(&layout, &found),
        vec!["Archived/old.md", "Trashed/bin.MD", "a.md", "b.md"]
    );
}

#[test]
fn custom_dirs_are_respected() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "Media/x.md");
    touch(temp.path(), "Attachments/y.md");

    let layout = VaultLayout::open(temp.path())
        .unwrap()
        .with_dirs("Old", "Bin", "Media");
    let found = layout.scan_markdown().unwrap();

    assert_eq!(relative(&layout, &found), vec!["Attachments/y.md"]);
    assert_eq!(layout.note_dir(true, true), layout.trashed());
    assert_eq!(layout.note_dir(false, true).file_name(), Some("Old"));
    assert_eq!(layout.note_dir(false, false), layout.root());
}

#[test]
fn ensure_structure_creates_directories() {
    let temp = TempDir::new().unwrap();
    let layout = VaultLayout::open(temp.path()).unwrap();
    layout.ensure_structure().unwrap();

    assert!(layout.archived().is_dir());
    assert!(layout.trashed().is_dir());
    assert!(layout.attachments().is_dir());
}

#[test]
fn attachment_files_lists_plain_files() {
    let temp = TempDir::new().unwrap();
    let layout = VaultLayout::open(temp.path()).unwrap();
    assert!(layout.attachment_files().unwrap().is_empty());

    layout.ensure_structure().unwrap();
    fs::write(temp.path().join("Attachments/b.png"), "b").unwrap();
    fs::write(temp.path().join("Attachments/a.jpg"), "a").unwrap();
    fs::create_dir(temp.path().join("Attachments/sub")).unwrap();

    assert_eq!(layout.attachment_files().unwrap(), vec!["a.jpg", "b.png"]);
}
