//! In-process note store

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CommitOutcome, Label, NoteHandle, PendingNote, RemoteStore};
use crate::model::{Color, NoteContent, NoteRecord};
use crate::normalize::normalize_label;
use crate::{Error, Result};

/// Serialized form of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// A [`RemoteStore`] held in memory.
///
/// Changes to existing notes are staged on copies and applied at commit,
/// which stamps them with the store clock. A failed commit rejects the
/// whole batch.
#[derive(Debug, Default)]
pub struct MemoryStore {
    notes: BTreeMap<String, NoteRecord>,
    labels: BTreeMap<String, Label>,
    staged: BTreeMap<String, NoteRecord>,
    pending: BTreeMap<PendingNote, NoteRecord>,
    next_pending: u64,
    now: Option<DateTime<Utc>>,
    commits: usize,
    fail_next_commit: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with committed notes.
    pub fn with_notes(notes: impl IntoIterator<Item = NoteRecord>) -> Self {
        let mut store = Self::new();
        for note in notes {
            store.insert(note);
        }
        store
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut store = Self::with_notes(snapshot.notes);
        for label in snapshot.labels {
            store.labels.insert(label.id.clone(), label);
        }
        store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            notes: self.notes.values().cloned().collect(),
            labels: self.labels.values().cloned().collect(),
        }
    }

    /// Add or replace a committed note, registering its labels.
    pub fn insert(&mut self, note: NoteRecord) {
        for name in &note.labels {
            self.label_named(name, true);
        }
        self.notes.insert(note.id.clone(), note);
    }

    /// Delete a committed note outright, as another client would.
    pub fn remove(&mut self, id: &str) -> Option<NoteRecord> {
        self.notes.remove(id)
    }

    /// Freeze the store clock.
    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = Some(now);
    }

    /// Make the next commit fail with `message`.
    pub fn fail_next_commit(&mut self, message: impl Into<String>) {
        self.fail_next_commit = Some(message.into());
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// True when changes are waiting for a commit.
    pub fn has_staged_changes(&self) -> bool {
        !self.staged.is_empty() || !self.pending.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    fn clock(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn label_named(&mut self, name: &str, create: bool) -> Option<Label> {
        let wanted = normalize_label(name);
        if let Some(label) = self
            .labels
            .values()
            .find(|l| normalize_label(&l.name) == wanted)
        {
            return Some(label.clone());
        }
        if !create || wanted.is_empty() {
            return None;
        }
        let label = Label {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
        };
        tracing::debug!(label = %label.name, "created label");
        self.labels.insert(label.id.clone(), label.clone());
        Some(label)
    }

    fn note_mut(&mut self, handle: &NoteHandle) -> Result<&mut NoteRecord> {
        match handle {
            NoteHandle::Existing(id) => {
                if !self.staged.contains_key(id) {
                    let current = self
                        .notes
                        .get(id)
                        .cloned()
                        .ok_or_else(|| Error::remote(format!("unknown note id '{id}'")))?;
                    self.staged.insert(id.clone(), current);
                }
                self.staged
                    .get_mut(id)
                    .ok_or_else(|| Error::remote(format!("unknown note id '{id}'")))
            }
            NoteHandle::Pending(pending) => self
                .pending
                .get_mut(pending)
                .ok_or_else(|| Error::remote(format!("unknown pending note {handle}"))),
        }
    }
}

impl RemoteStore for MemoryStore {
    fn all_notes(&self) -> Result<Vec<NoteRecord>> {
        Ok(self.notes.values().cloned().collect())
    }

    fn get(&self, id: &str) -> Result<Option<NoteRecord>> {
        Ok(self.notes.get(id).cloned())
    }

    fn create(&mut self, title: &str, content: NoteContent) -> Result<PendingNote> {
        let pending = PendingNote::new(self.next_pending);
        self.next_pending += 1;
        let record = NoteRecord {
            title: title.to_string(),
            content,
            ..NoteRecord::default()
        };
        self.pending.insert(pending, record);
        Ok(pending)
    }

    fn set_title(&mut self, note: &NoteHandle, title: &str) -> Result<()> {
        self.note_mut(note)?.title = title.to_string();
        Ok(())
    }

    fn set_content(&mut self, note: &NoteHandle, content: NoteContent) -> Result<()> {
        self.note_mut(note)?.content = content;
        Ok(())
    }

    fn set_color(&mut self, note: &NoteHandle, color: Color) -> Result<()> {
        self.note_mut(note)?.color = color;
        Ok(())
    }

    fn set_pinned(&mut self, note: &NoteHandle, pinned: bool) -> Result<()> {
        self.note_mut(note)?.pinned = pinned;
        Ok(())
    }

    fn set_archived(&mut self, note: &NoteHandle, archived: bool) -> Result<()> {
        self.note_mut(note)?.archived = archived;
        Ok(())
    }

    fn set_trashed(&mut self, note: &NoteHandle, trashed: bool) -> Result<()> {
        self.note_mut(note)?.trashed = trashed;
        Ok(())
    }

    fn find_label(&mut self, name: &str, create: bool) -> Result<Option<Label>> {
        Ok(self.label_named(name, create))
    }

    fn add_label(&mut self, note: &NoteHandle, label: &Label) -> Result<()> {
        self.note_mut(note)?.labels.insert(label.name.clone());
        Ok(())
    }

    fn remove_label(&mut self, note: &NoteHandle, label: &Label) -> Result<()> {
        let wanted = normalize_label(&label.name);
        let record = self.note_mut(note)?;
        let keep: BTreeSet<String> = record
            .labels
            .iter()
            .filter(|l| normalize_label(l) != wanted)
            .cloned()
            .collect();
        record.labels = keep;
        Ok(())
    }

    fn discard(&mut self, note: &NoteHandle) -> Result<()> {
        match note {
            NoteHandle::Existing(id) => {
                self.staged.remove(id);
            }
            NoteHandle::Pending(pending) => {
                self.pending.remove(pending);
            }
        }
        tracing::debug!(%note, "discarded staged changes");
        Ok(())
    }

    fn commit(&mut self) -> Result<CommitOutcome> {
        if let Some(message) = self.fail_next_commit.take() {
            tracing::warn!(%message, "commit rejected, discarding staged changes");
            self.staged.clear();
            self.pending.clear();
            return Err(Error::remote(message));
        }

        let now = self.clock();
        let mut outcome = CommitOutcome::default();

        for (id, mut record) in std::mem::take(&mut self.staged) {
            record.timestamps.updated = Some(now);
            record.timestamps.edited = Some(now);
            self.notes.insert(id, record);
            outcome.updated += 1;
        }

        for (pending, mut record) in std::mem::take(&mut self.pending) {
            record.id = Uuid::new_v4().to_string();
            record.timestamps.created = Some(now);
            record.timestamps.updated = Some(now);
            self.notes.insert(record.id.clone(), record.clone());
            outcome.created.insert(pending, record);
        }

        self.commits += 1;
        tracing::debug!(
            created = outcome.created.len(),
            updated = outcome.updated,
            "committed batch"
        );
        Ok(outcome)
    }
}
