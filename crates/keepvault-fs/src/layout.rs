//! Vault directory layout
//!
//! A vault is a directory of markdown notes. Active notes live at the root,
//! archived and trashed notes in dedicated subdirectories, and downloaded
//! attachments in their own directory that is never scanned for notes.

use std::path::Path;

use walkdir::WalkDir;

use crate::constants::NOTE_EXTENSION;
use crate::{Error, NormalizedPath, Result, VaultDir};

/// Resolved directories of one vault.
#[derive(Debug, Clone)]
pub struct VaultLayout {
    root: NormalizedPath,
    archived: NormalizedPath,
    trashed: NormalizedPath,
    attachments: NormalizedPath,
    ignored: Vec<String>,
}

impl VaultLayout {
    /// Open an existing vault directory with the default directory names.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::VaultNotFound {
                path: root.to_path_buf(),
            });
        }
        let canonical = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;
        Ok(Self::with_root(NormalizedPath::new(canonical)))
    }

    fn with_root(root: NormalizedPath) -> Self {
        Self {
            archived: root.join(VaultDir::Archived.as_str()),
            trashed: root.join(VaultDir::Trashed.as_str()),
            attachments: root.join(VaultDir::Attachments.as_str()),
            ignored: vec![
                VaultDir::Obsidian.as_str().to_string(),
                VaultDir::Config.as_str().to_string(),
            ],
            root,
        }
    }

    /// Override the archive, trash and attachment directory names.
    pub fn with_dirs(mut self, archived: &str, trashed: &str, attachments: &str) -> Self {
        self.archived = self.root.join(archived);
        self.trashed = self.root.join(trashed);
        self.attachments = self.root.join(attachments);
        self
    }

    /// Replace the set of directory names skipped during scans.
    pub fn with_ignored<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn archived(&self) -> &NormalizedPath {
        &self.archived
    }

    pub fn trashed(&self) -> &NormalizedPath {
        &self.trashed
    }

    pub fn attachments(&self) -> &NormalizedPath {
        &self.attachments
    }

    /// Directory a note belongs in. Trash wins over archive.
    pub fn note_dir(&self, trashed: bool, archived: bool) -> &NormalizedPath {
        if trashed {
            &self.trashed
        } else if archived {
            &self.archived
        } else {
            &self.root
        }
    }

    /// Create the archive, trash and attachment directories if missing.
    pub fn ensure_structure(&self) -> Result<()> {
        for dir in [&self.archived, &self.trashed, &self.attachments] {
            let native = dir.to_native();
            std::fs::create_dir_all(&native).map_err(|e| Error::io(&native, e))?;
        }
        Ok(())
    }

    /// Recursively list every `.md` file in the vault, sorted by path.
    ///
    /// Ignored directories and the attachment directory are not descended.
    pub fn scan_markdown(&self) -> Result<Vec<NormalizedPath>> {
        let root = self.root.to_native();
        let attachments = self.attachments.clone();
        let mut found = Vec::new();

        let walker = WalkDir::new(&root).follow_links(false).into_iter();
        for entry in walker.filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            if self.ignored.iter().any(|ignored| ignored.as_str() == name.as_ref()) {
                return false;
            }
            NormalizedPath::new(e.path()) != attachments
        }) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root.as_path()).to_path_buf();
                Error::io(path, std::io::Error::from(e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_note = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(NOTE_EXTENSION));
            if is_note {
                found.push(NormalizedPath::new(entry.path()));
            }
        }

        found.sort();
        tracing::debug!(root = %self.root, count = found.len(), "scanned vault");
        Ok(found)
    }

    /// List file names directly inside the attachment directory.
    pub fn attachment_files(&self) -> Result<Vec<String>> {
        let native = self.attachments.to_native();
        let entries = match std::fs::read_dir(&native) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&native, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&native, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
