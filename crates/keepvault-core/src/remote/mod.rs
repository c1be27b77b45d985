//! The remote note store seam
//!
//! The engine talks to the store only through [`RemoteStore`]. Mutations are
//! staged and become visible, with server-assigned ids and timestamps, only
//! after [`RemoteStore::commit`].

mod json_file;
mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::model::{Color, NoteContent, NoteRecord};

pub use json_file::JsonFileStore;
pub use memory::{MemoryStore, StoreSnapshot};

/// Handle for a note created in the current batch but not yet committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingNote(u64);

impl PendingNote {
    pub fn new(key: u64) -> Self {
        Self(key)
    }

    pub fn key(&self) -> u64 {
        self.0
    }
}

/// A note addressed by a setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteHandle {
    /// A committed note, by id.
    Existing(String),
    /// A note created in this batch.
    Pending(PendingNote),
}

impl NoteHandle {
    pub fn existing(id: impl Into<String>) -> Self {
        Self::Existing(id.into())
    }
}

impl std::fmt::Display for NoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Existing(id) => f.write_str(id),
            Self::Pending(p) => write!(f, "pending#{}", p.key()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

/// Result of a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Authoritative records of the notes created in this batch.
    pub created: BTreeMap<PendingNote, NoteRecord>,
    /// Number of existing notes changed.
    pub updated: usize,
}

/// Operations the engine needs from a note store.
pub trait RemoteStore {
    /// Every committed note, trashed ones included.
    fn all_notes(&self) -> Result<Vec<NoteRecord>>;

    fn get(&self, id: &str) -> Result<Option<NoteRecord>>;

    /// Stage a new note. Its id is only known after [`commit`](Self::commit).
    fn create(&mut self, title: &str, content: NoteContent) -> Result<PendingNote>;

    fn set_title(&mut self, note: &NoteHandle, title: &str) -> Result<()>;

    fn set_content(&mut self, note: &NoteHandle, content: NoteContent) -> Result<()>;

    fn set_color(&mut self, note: &NoteHandle, color: Color) -> Result<()>;

    fn set_pinned(&mut self, note: &NoteHandle, pinned: bool) -> Result<()>;

    fn set_archived(&mut self, note: &NoteHandle, archived: bool) -> Result<()>;

    fn set_trashed(&mut self, note: &NoteHandle, trashed: bool) -> Result<()>;

    /// Look up a label by name, creating it when `create` is set.
    fn find_label(&mut self, name: &str, create: bool) -> Result<Option<Label>>;

    fn add_label(&mut self, note: &NoteHandle, label: &Label) -> Result<()>;

    fn remove_label(&mut self, note: &NoteHandle, label: &Label) -> Result<()>;

    /// Drop every staged change for `note`. A pending note is forgotten.
    fn discard(&mut self, note: &NoteHandle) -> Result<()>;

    /// Push every staged change in one batch.
    fn commit(&mut self) -> Result<CommitOutcome>;
}
