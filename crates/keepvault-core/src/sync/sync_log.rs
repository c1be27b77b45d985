//! The sync log note
//!
//! After each real run the report summary is written to a pinned remote
//! note and mirrored into the vault root. Both are left out of regular
//! pull and push processing.

use keepvault_fs::{NormalizedPath, VaultLayout, io};

use super::report::SyncReport;
use crate::config::SyncConfig;
use crate::model::{NoteContent, NoteRecord};
use crate::remote::{NoteHandle, RemoteStore};
use crate::vault::{Frontmatter, LocalNoteFile, render_markdown_body};
use crate::{Error, Result};

/// Tag carried by the local mirror.
pub const SYNC_LOG_TAG: &str = "sync_log";

/// Create or update the log note, commit, and refresh the mirror.
pub(crate) fn write(
    layout: &VaultLayout,
    config: &SyncConfig,
    store: &mut dyn RemoteStore,
    report: &SyncReport,
) -> Result<()> {
    let title = &config.sync_log.title;
    let mirror = layout.root().join(&config.sync_log.file_name);
    let body = NoteContent::Text(report.summary());

    let handle = match find_existing(store, &mirror, title)? {
        Some(existing) => {
            let handle = NoteHandle::existing(existing.id);
            store.set_content(&handle, body)?;
            handle
        }
        None => NoteHandle::Pending(store.create(title, body)?),
    };
    store.set_pinned(&handle, true)?;
    store.set_archived(&handle, false)?;
    store.set_trashed(&handle, false)?;

    let outcome = store.commit()?;
    let record = match &handle {
        NoteHandle::Pending(pending) => outcome.created.get(pending).cloned(),
        NoteHandle::Existing(id) => store.get(id)?,
    }
    .ok_or_else(|| Error::remote("sync log note missing after commit"))?;

    write_mirror(&mirror, &record, &config.vault.attachments_dir)?;
    tracing::info!(note_id = %record.id, path = %mirror, "sync log written");
    Ok(())
}

/// The log note: by the mirror's id first, then by title.
fn find_existing(
    store: &dyn RemoteStore,
    mirror: &NormalizedPath,
    title: &str,
) -> Result<Option<NoteRecord>> {
    if mirror.is_file() {
        match LocalNoteFile::load(mirror) {
            Ok(file) => {
                if let Some(id) = file.id() {
                    if let Some(note) = store.get(id)?.filter(|n| !n.trashed) {
                        return Ok(Some(note));
                    }
                }
            }
            Err(e) => tracing::warn!(path = %mirror, error = %e, "ignoring unreadable sync log mirror"),
        }
    }

    Ok(store
        .all_notes()?
        .into_iter()
        .find(|n| !n.trashed && n.title == title))
}

fn write_mirror(path: &NormalizedPath, record: &NoteRecord, attachments_dir: &str) -> Result<()> {
    let mut frontmatter = Frontmatter::from_record(record);
    frontmatter.tags = vec![SYNC_LOG_TAG.to_string()];
    let text = format!(
        "---\n{}\n---\n{}",
        frontmatter.to_yaml()?.trim_end(),
        render_markdown_body(record, attachments_dir)
    );
    io::write_text(path, &text)?;
    if let Some(updated) = record.updated() {
        io::set_modified_time(path, updated)?;
    }
    Ok(())
}
