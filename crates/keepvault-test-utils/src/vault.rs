//! [`TestVault`] builder for sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use keepvault_fs::{NormalizedPath, io};
use serde_yaml::{Mapping, Value};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A temporary vault directory with helpers for writing notes and asserting
/// on the result.
///
/// # Example
///
/// ```rust,no_run
/// use keepvault_test_utils::TestVault;
///
/// let vault = TestVault::new();
/// vault.write_note("Groceries.md", &[("id", "abc123"), ("title", "Groceries")], "milk\neggs");
/// vault.assert_file_contains("Groceries.md", "milk");
/// ```
pub struct TestVault {
    temp_dir: TempDir,
}

impl Default for TestVault {
    fn default() -> Self {
        Self::new()
    }
}

impl TestVault {
    /// Create an empty vault directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Root path of the vault.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel`.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn normalized(&self, rel: &str) -> NormalizedPath {
        NormalizedPath::new(self.path(rel))
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write_file(&self, rel: &str, content: &str) {
        let full_path = self.path(rel);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Could not write {}: {e}", full_path.display()));
    }

    /// Write a note with the given frontmatter fields and body.
    ///
    /// Values `true`/`false` are written as booleans, values starting with
    /// `[` as YAML flow lists, everything else as strings.
    pub fn write_note(&self, rel: &str, fields: &[(&str, &str)], body: &str) {
        let mut mapping = Mapping::new();
        for (key, value) in fields {
            mapping.insert(Value::String(key.to_string()), yaml_value(value));
        }
        let yaml = serde_yaml::to_string(&mapping).unwrap();
        self.write_file(rel, &format!("---\n{}\n---\n{body}", yaml.trim_end()));
    }

    /// Set the modification time of `rel`.
    pub fn set_mtime(&self, rel: &str, when: DateTime<Utc>) {
        io::set_modified_time(&self.normalized(rel), when).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        let full_path = self.path(rel);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Every `.md` file below the root, relative and sorted.
    pub fn markdown_files(&self) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(self.root())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
            .filter_map(|e| {
                e.path()
                    .strip_prefix(self.root())
                    .ok()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect();
        files.sort();
        files
    }

    /// Assert that `rel` exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}\nvault contains: {:?}",
            full_path.display(),
            self.markdown_files()
        );
    }

    /// Assert that `rel` does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `rel` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, rel: &str, content: &str) {
        let file_content = self.read(rel);
        assert!(
            file_content.contains(content),
            "File {rel} does not contain {content:?}. Content:\n{file_content}"
        );
    }
}

fn yaml_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        list if list.starts_with('[') => serde_yaml::from_str(list).unwrap(),
        other => Value::String(other.to_string()),
    }
}
