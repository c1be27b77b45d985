//! Vault scanning and the id index

use std::collections::BTreeMap;

use keepvault_fs::{NormalizedPath, VaultLayout};

use super::note_file::LocalNoteFile;
use crate::{Error, Result};

/// Every parseable note file in the vault, keyed by id where present.
///
/// Ids are unique: a second file claiming an id already seen is excluded
/// and listed in `duplicates`.
#[derive(Debug, Default)]
pub struct VaultIndex {
    by_id: BTreeMap<String, LocalNoteFile>,
    unidentified: Vec<LocalNoteFile>,
    duplicates: Vec<NormalizedPath>,
    malformed: Vec<(NormalizedPath, String)>,
    unreadable: Vec<(NormalizedPath, String)>,
}

impl VaultIndex {
    /// Scan the vault and parse every note, skipping the `exclude` paths.
    pub fn build(layout: &VaultLayout, exclude: &[NormalizedPath]) -> Result<Self> {
        let mut index = Self::default();
        for path in layout.scan_markdown()? {
            if exclude.contains(&path) {
                continue;
            }
            match LocalNoteFile::load(&path) {
                Ok(file) => index.insert(file),
                Err(Error::Parse { path, message }) => {
                    tracing::warn!(path = %path, %message, "skipping note with malformed frontmatter");
                    index.malformed.push((path, message));
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "skipping unreadable note");
                    index.unreadable.push((path, e.to_string()));
                }
            }
        }
        tracing::debug!(
            indexed = index.by_id.len(),
            unidentified = index.unidentified.len(),
            "built vault index"
        );
        Ok(index)
    }

    /// Add a parsed file. Returns without indexing when the id is taken.
    pub fn insert(&mut self, file: LocalNoteFile) {
        let Some(id) = file.id().map(str::to_string) else {
            self.unidentified.push(file);
            return;
        };
        if let Some(existing) = self.by_id.get(&id) {
            tracing::warn!(
                note_id = %id,
                kept = %existing.path,
                skipped = %file.path,
                "duplicate note id in vault"
            );
            self.duplicates.push(file.path);
            return;
        }
        self.by_id.insert(id, file);
    }

    pub fn get(&self, id: &str) -> Option<&LocalNoteFile> {
        self.by_id.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<LocalNoteFile> {
        self.by_id.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Files without an id.
    pub fn unidentified(&self) -> &[LocalNoteFile] {
        &self.unidentified
    }

    pub fn duplicates(&self) -> &[NormalizedPath] {
        &self.duplicates
    }

    pub fn malformed(&self) -> &[(NormalizedPath, String)] {
        &self.malformed
    }

    pub fn unreadable(&self) -> &[(NormalizedPath, String)] {
        &self.unreadable
    }

    /// All indexed and unidentified files, ordered by path.
    pub fn files(&self) -> Vec<&LocalNoteFile> {
        let mut files: Vec<&LocalNoteFile> =
            self.by_id.values().chain(self.unidentified.iter()).collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }
}
