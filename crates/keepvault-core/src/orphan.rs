//! Removal of local artifacts whose remote note is gone
//!
//! The remote snapshot decides membership. A note id that was indexed
//! locally but neither processed nor errored during the pull is an orphan.

use std::collections::{BTreeSet, HashSet};

use keepvault_fs::{NormalizedPath, VaultLayout, io};

use crate::model::NoteRecord;
use crate::vault::VaultIndex;

/// What the reconciler removed (or would remove, in a dry run).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanOutcome {
    pub notes_deleted: Vec<NormalizedPath>,
    pub attachments_deleted: Vec<String>,
    pub errors: Vec<String>,
}

/// Indexed ids not in `processed` and not in `errored`, sorted.
pub fn orphan_ids(
    index: &VaultIndex,
    processed: &HashSet<String>,
    errored: &HashSet<String>,
) -> Vec<String> {
    index
        .ids()
        .filter(|id| !processed.contains(*id) && !errored.contains(*id))
        .map(str::to_string)
        .collect()
}

/// Attachment file names referenced by no note in the snapshot.
pub fn orphan_attachments(files: &[String], snapshot: &[NoteRecord]) -> Vec<String> {
    let referenced: BTreeSet<&str> = snapshot
        .iter()
        .flat_map(|note| note.attachments.iter())
        .map(|a| a.filename.as_str())
        .collect();
    files
        .iter()
        .filter(|name| !referenced.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Delete orphaned notes and attachments.
///
/// Deleted notes are removed from `index`. Failures are collected and do
/// not stop the remaining deletions.
pub fn reconcile(
    layout: &VaultLayout,
    index: &mut VaultIndex,
    snapshot: &[NoteRecord],
    processed: &HashSet<String>,
    errored: &HashSet<String>,
    dry_run: bool,
) -> OrphanOutcome {
    let mut outcome = OrphanOutcome::default();

    for id in orphan_ids(index, processed, errored) {
        let Some(file) = index.get(&id) else {
            continue;
        };
        let path = file.path.clone();
        if dry_run {
            tracing::info!(note_id = %id, path = %path, "[dry-run] would delete orphaned note");
        } else if let Err(e) = io::remove_file(&path) {
            tracing::error!(note_id = %id, path = %path, error = %e, "failed to delete orphaned note");
            outcome.errors.push(format!("Failed to delete {path}: {e}"));
            continue;
        } else {
            tracing::info!(note_id = %id, path = %path, "deleted orphaned note");
        }
        index.remove(&id);
        outcome.notes_deleted.push(path);
    }

    let files = match layout.attachment_files() {
        Ok(files) => files,
        Err(e) => {
            outcome.errors.push(format!("Failed to list attachments: {e}"));
            return outcome;
        }
    };
    for name in orphan_attachments(&files, snapshot) {
        let path = layout.attachments().join(&name);
        if !dry_run {
            if let Err(e) = io::remove_file(&path) {
                tracing::error!(path = %path, error = %e, "failed to delete orphaned attachment");
                outcome.errors.push(format!("Failed to delete {path}: {e}"));
                continue;
            }
        }
        tracing::info!(path = %path, dry_run, "orphaned attachment removed");
        outcome.attachments_deleted.push(name);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::LocalNoteFile;
    use pretty_assertions::assert_eq;

    fn index_of(ids: &[&str]) -> VaultIndex {
        let mut index = VaultIndex::default();
        for id in ids {
            let text = format!("---\nid: {id}\n---\n");
            index.insert(
                LocalNoteFile::parse(NormalizedPath::new(format!("/v/{id}.md")), &text, None)
                    .unwrap(),
            );
        }
        index
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn orphans_are_exactly_the_unprocessed_ids() {
        let index = index_of(&["a", "b", "c", "d"]);
        let orphans = orphan_ids(&index, &set(&["a", "c"]), &set(&[]));
        assert_eq!(orphans, vec!["b", "d"]);
    }

    #[test]
    fn errored_ids_are_never_orphans() {
        let index = index_of(&["a", "b"]);
        let orphans = orphan_ids(&index, &set(&["a"]), &set(&["b"]));
        assert!(orphans.is_empty());
    }

    #[test]
    fn referenced_attachments_survive() {
        let snapshot = vec![
            NoteRecord::text("a", "A", "").with_attachment("1", "keep.png"),
            NoteRecord::text("b", "B", "").with_attachment("2", "also.pdf"),
        ];
        let files = vec!["also.pdf".to_string(), "gone.jpg".to_string(), "keep.png".to_string()];
        assert_eq!(orphan_attachments(&files, &snapshot), vec!["gone.jpg"]);
    }
}
