//! Note store persisted to a JSON file

use keepvault_fs::{NormalizedPath, io};

use super::memory::{MemoryStore, StoreSnapshot};
use super::{CommitOutcome, Label, NoteHandle, PendingNote, RemoteStore};
use crate::Result;
use crate::model::{Color, NoteContent, NoteRecord};

/// A [`MemoryStore`] loaded from and saved to a JSON document.
///
/// The file holds `{ "notes": [...], "labels": [...] }` and is rewritten
/// atomically after every successful commit.
#[derive(Debug)]
pub struct JsonFileStore {
    path: NormalizedPath,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<NormalizedPath>) -> Result<Self> {
        let path = path.into();
        let inner = if path.is_file() {
            let text = io::read_text(&path)?;
            let snapshot: StoreSnapshot = serde_json::from_str(&text)?;
            tracing::debug!(path = %path, notes = snapshot.notes.len(), "loaded remote store");
            MemoryStore::from_snapshot(snapshot)
        } else {
            tracing::debug!(path = %path, "remote store file missing, starting empty");
            MemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Write the committed state to disk.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.inner.snapshot())?;
        io::write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl RemoteStore for JsonFileStore {
    fn all_notes(&self) -> Result<Vec<NoteRecord>> {
        self.inner.all_notes()
    }

    fn get(&self, id: &str) -> Result<Option<NoteRecord>> {
        self.inner.get(id)
    }

    fn create(&mut self, title: &str, content: NoteContent) -> Result<PendingNote> {
        self.inner.create(title, content)
    }

    fn set_title(&mut self, note: &NoteHandle, title: &str) -> Result<()> {
        self.inner.set_title(note, title)
    }

    fn set_content(&mut self, note: &NoteHandle, content: NoteContent) -> Result<()> {
        self.inner.set_content(note, content)
    }

    fn set_color(&mut self, note: &NoteHandle, color: Color) -> Result<()> {
        self.inner.set_color(note, color)
    }

    fn set_pinned(&mut self, note: &NoteHandle, pinned: bool) -> Result<()> {
        self.inner.set_pinned(note, pinned)
    }

    fn set_archived(&mut self, note: &NoteHandle, archived: bool) -> Result<()> {
        self.inner.set_archived(note, archived)
    }

    fn set_trashed(&mut self, note: &NoteHandle, trashed: bool) -> Result<()> {
        self.inner.set_trashed(note, trashed)
    }

    fn find_label(&mut self, name: &str, create: bool) -> Result<Option<Label>> {
        self.inner.find_label(name, create)
    }

    fn add_label(&mut self, note: &NoteHandle, label: &Label) -> Result<()> {
        self.inner.add_label(note, label)
    }

    fn remove_label(&mut self, note: &NoteHandle, label: &Label) -> Result<()> {
        self.inner.remove_label(note, label)
    }

    fn discard(&mut self, note: &NoteHandle) -> Result<()> {
        self.inner.discard(note)
    }

    fn commit(&mut self) -> Result<CommitOutcome> {
        let outcome = self.inner.commit()?;
        self.save()?;
        Ok(outcome)
    }
}
