//! Push phase: local edits into the remote store
//!
//! Every file is analysed before anything is sent. Creates and updates are
//! then applied and committed in a single batch, after which created files
//! receive their server-assigned ids.

use keepvault_fs::{NormalizedPath, io};

use super::engine::RunContext;
use super::pull::write_note;
use crate::detect::{ChangeSet, Reason, detect, label_delta};
use crate::model::{NoteContent, NoteRecord};
use crate::normalize::collapse_whitespace;
use crate::policy::{DecisionProvider, SkipReason, SyncAction, decide, find_duplicate};
use crate::remote::{NoteHandle, PendingNote, RemoteStore};
use crate::vault::{LocalNoteFile, VaultIndex};
use crate::{Error, Result};

/// Remote mutations planned by the analysis step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushPlan {
    pub actions: Vec<SyncAction>,
}

impl PushPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn creates(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SyncAction::Create { .. }))
            .count()
    }

    pub fn updates(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SyncAction::Update { .. }))
            .count()
    }
}

/// A planned action with the file it came from.
struct Planned<'i> {
    action: SyncAction,
    file: &'i LocalNoteFile,
    remote: Option<NoteRecord>,
}

pub(crate) fn run(
    ctx: &mut RunContext<'_>,
    index: &VaultIndex,
    store: &mut dyn RemoteStore,
    provider: &mut dyn DecisionProvider,
) -> Result<()> {
    let planned = analyse(ctx, index, provider)?;
    if planned.is_empty() {
        tracing::info!("nothing to push");
        return Ok(());
    }

    let plan = PushPlan {
        actions: planned.iter().map(|p| p.action.clone()).collect(),
    };
    if !ctx.options.skips_confirmation() && !provider.confirm_batch(&plan)? {
        tracing::info!(planned = plan.len(), "push cancelled at confirmation");
        ctx.report.push_cancelled = true;
        return Ok(());
    }

    if ctx.dry_run() {
        for item in &planned {
            match &item.action {
                SyncAction::Create { path } => {
                    ctx.report.push.created += 1;
                    ctx.report.action(String::new(), format!("create note from {path}"));
                }
                SyncAction::Update {
                    note_id, reasons, ..
                } => {
                    ctx.report.push.updated += 1;
                    ctx.report
                        .action(String::new(), format!("update note {note_id} ({reasons})"));
                }
                _ => {}
            }
        }
        return Ok(());
    }

    apply(ctx, &planned, store);
    Ok(())
}

/// Decide an action for every file, handling the ones that need no commit.
fn analyse<'i>(
    ctx: &mut RunContext<'_>,
    index: &'i VaultIndex,
    provider: &mut dyn DecisionProvider,
) -> Result<Vec<Planned<'i>>> {
    let flags = ctx.options.policy_flags();
    let mut planned = Vec::new();

    for file in index.files() {
        let (remote, changes) = match file.id() {
            None => {
                let candidate = file.candidate_title();
                (find_duplicate(&candidate, &ctx.snapshot).cloned(), ChangeSet::default())
            }
            Some(id) => {
                let remote = ctx.snapshot.iter().find(|n| n.id == id).cloned();
                let changes = remote
                    .as_ref()
                    .map(|r| detect(r, file))
                    .unwrap_or_default();
                (remote, changes)
            }
        };

        let action = match decide(file, remote.as_ref(), &changes, flags, provider) {
            Ok(action) => action,
            Err(e) if e.is_run_fatal() => {
                tracing::error!(path = %file.path, error = %e, "aborting run");
                return Err(e);
            }
            Err(e) => {
                tracing::error!(path = %file.path, error = %e, "push analysis failed");
                ctx.report.push.errors_analysis += 1;
                ctx.report.error(format!("Analysis failed for {}: {e}", file.path));
                continue;
            }
        };
        tracing::debug!(path = %file.path, action = %action, "push decision");

        let counters = &mut ctx.report.push;
        match &action {
            SyncAction::Create { .. } => {}
            SyncAction::Update { .. } => {
                if flags.cherry_pick {
                    counters.cherry_pick_local += 1;
                }
            }
            SyncAction::Skip { reason, .. } => match reason {
                SkipReason::PotentialDuplicate { remote_id } => {
                    tracing::warn!(path = %file.path, %remote_id, "possible duplicate, not creating");
                    counters.potential_duplicates += 1;
                }
                SkipReason::RemoteDeleted => counters.remote_deleted += 1,
                SkipReason::NoChange => counters.skipped_no_change += 1,
                SkipReason::NoMaterialChange => counters.skipped_no_material_change += 1,
                SkipReason::UserSkipped => counters.cherry_pick_skipped += 1,
                SkipReason::DryRunPrompt => counters.cherry_pick_prompts += 1,
            },
            SyncAction::Conflict {
                note_id, reasons, ..
            } => {
                tracing::warn!(%note_id, path = %file.path, %reasons, "remote is newer, not pushing");
                counters.conflicts += 1;
            }
            SyncAction::RewriteLocal { note_id, path } => {
                counters.cherry_pick_remote += 1;
                if let Some(record) = &remote {
                    match rewrite_local(ctx, record, path) {
                        Ok(target) => ctx.report.action(
                            format!("Replaced {path} with remote note {note_id} at {target}"),
                            format!("replace {path} with remote note {note_id} at {target}"),
                        ),
                        Err(e) => {
                            ctx.report.push.errors_apply += 1;
                            ctx.report.error(format!("Failed to rewrite {path}: {e}"));
                        }
                    }
                }
            }
        }

        if action.is_remote_mutation() {
            planned.push(Planned {
                action,
                file,
                remote,
            });
        }
    }

    Ok(planned)
}

/// Move a file to where the remote note belongs and overwrite it there.
fn rewrite_local(
    ctx: &mut RunContext<'_>,
    record: &NoteRecord,
    path: &NormalizedPath,
) -> Result<NormalizedPath> {
    let target = ctx.placement.place(
        &record.title,
        &record.id,
        record.trashed,
        record.archived,
        Some(path),
    )?;
    if target != *path && !ctx.dry_run() {
        io::move_file(path, &target)?;
    }
    write_note(ctx, record, &target)?;
    Ok(target)
}

/// Apply planned actions, commit once, and finalize created files.
fn apply(ctx: &mut RunContext<'_>, planned: &[Planned<'_>], store: &mut dyn RemoteStore) {
    let mut created: Vec<(PendingNote, &LocalNoteFile)> = Vec::new();
    let mut updated: Vec<&SyncAction> = Vec::new();

    for item in planned {
        let result = match (&item.action, &item.remote) {
            (SyncAction::Create { .. }, _) => {
                apply_create(store, item.file).map(|pending| created.push((pending, item.file)))
            }
            (SyncAction::Update { reasons, .. }, Some(remote)) => {
                apply_update(store, item.file, remote, reasons).map(|()| updated.push(&item.action))
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            tracing::error!(path = %item.file.path, error = %e, "failed to apply change");
            ctx.report.push.errors_apply += 1;
            ctx.report
                .error(format!("Failed to push {}: {e}", item.file.path));
        }
    }

    if created.is_empty() && updated.is_empty() {
        return;
    }

    let outcome = match store.commit() {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "commit failed, created files keep no id");
            ctx.report.push.errors_commit += 1;
            ctx.report.error(format!("Commit failed: {e}"));
            return;
        }
    };

    for action in updated {
        if let SyncAction::Update {
            note_id, reasons, ..
        } = action
        {
            ctx.report.push.updated += 1;
            ctx.report.action(
                format!("Updated note {note_id} ({reasons})"),
                format!("update note {note_id} ({reasons})"),
            );
        }
    }

    for (pending, file) in created {
        let result = outcome
            .created
            .get(&pending)
            .ok_or_else(|| Error::remote(format!("commit returned no note for {}", file.path)))
            .and_then(|record| finalize(file, record).map(|()| record));
        match result {
            Ok(record) => {
                ctx.report.push.created += 1;
                ctx.report.action(
                    format!("Created note {} from {}", record.id, file.path),
                    format!("create note from {}", file.path),
                );
            }
            Err(e) => {
                tracing::error!(path = %file.path, error = %e, "failed to finalize created note");
                ctx.report.push.errors_finalize += 1;
                ctx.report
                    .error(format!("Failed to finalize {}: {e}", file.path));
            }
        }
    }
}

fn apply_update(
    store: &mut dyn RemoteStore,
    file: &LocalNoteFile,
    remote: &NoteRecord,
    reasons: &ChangeSet,
) -> Result<()> {
    let handle = NoteHandle::existing(&remote.id);
    stage_update(store, &handle, file, remote, reasons)
        .inspect_err(|_| discard(store, &handle))
}

fn stage_update(
    store: &mut dyn RemoteStore,
    handle: &NoteHandle,
    file: &LocalNoteFile,
    remote: &NoteRecord,
    reasons: &ChangeSet,
) -> Result<()> {
    let fm = &file.frontmatter;
    let content = file.content();

    if reasons.contains(Reason::Title) {
        store.set_title(handle, &collapse_whitespace(&content.title))?;
    }
    if reasons.contains(Reason::Content) {
        let checklist = remote.content.is_checklist();
        store.set_content(handle, content.to_note_content(checklist))?;
    }
    if reasons.contains(Reason::Color) {
        match fm.color_value() {
            Ok(color) => store.set_color(handle, color)?,
            Err(name) => tracing::warn!(note_id = %remote.id, color = name, "skipping unknown colour"),
        }
    }
    if reasons.contains(Reason::Pinned) {
        store.set_pinned(handle, fm.is_pinned())?;
    }
    if reasons.contains(Reason::Archived) {
        store.set_archived(handle, fm.is_archived())?;
    }
    if reasons.contains(Reason::Trashed) {
        store.set_trashed(handle, fm.is_trashed())?;
    }

    let (to_add, to_remove) = label_delta(&fm.tags, &remote.labels);
    for name in &to_add {
        if let Some(label) = store.find_label(name, true)? {
            store.add_label(handle, &label)?;
        }
    }
    for name in &to_remove {
        match store.find_label(name, false)? {
            Some(label) => store.remove_label(handle, &label)?,
            None => tracing::warn!(note_id = %remote.id, label = %name, "label to remove not found"),
        }
    }

    tracing::debug!(note_id = %remote.id, %reasons, "staged update");
    Ok(())
}

fn apply_create(store: &mut dyn RemoteStore, file: &LocalNoteFile) -> Result<PendingNote> {
    let content = file.content();
    let title = collapse_whitespace(&file.candidate_title());
    let note_content: NoteContent = content.to_note_content(content.has_checklist());

    let pending = store.create(&title, note_content)?;
    let handle = NoteHandle::Pending(pending);
    stage_metadata(store, &handle, file).inspect_err(|_| discard(store, &handle))?;

    tracing::debug!(path = %file.path, %title, "staged new note");
    Ok(pending)
}

fn stage_metadata(
    store: &mut dyn RemoteStore,
    handle: &NoteHandle,
    file: &LocalNoteFile,
) -> Result<()> {
    let fm = &file.frontmatter;
    match fm.color_value() {
        Ok(color) => store.set_color(handle, color)?,
        Err(name) => tracing::warn!(path = %file.path, color = name, "skipping unknown colour"),
    }
    store.set_pinned(handle, fm.is_pinned())?;
    store.set_archived(handle, fm.is_archived())?;
    store.set_trashed(handle, fm.is_trashed())?;
    for tag in &fm.tags {
        if let Some(label) = store.find_label(tag, true)? {
            store.add_label(handle, &label)?;
        }
    }
    Ok(())
}

/// Drop a half-staged note so a later commit does not send it.
fn discard(store: &mut dyn RemoteStore, handle: &NoteHandle) {
    if let Err(e) = store.discard(handle) {
        tracing::warn!(note = %handle, error = %e, "failed to discard staged changes");
    }
}

/// Write the authoritative id and metadata into a created file.
fn finalize(file: &LocalNoteFile, record: &NoteRecord) -> Result<()> {
    let mut finalized = file.clone();
    // The heading became the YAML title and is no longer part of the text.
    if file.content().title_from_heading {
        finalized.body = file.body_without_heading();
    }
    finalized.frontmatter.adopt_record(record);
    finalized.has_frontmatter = true;

    io::write_text(&file.path, &finalized.to_markdown()?)?;
    if let Some(updated) = record.updated() {
        io::set_modified_time(&file.path, updated)?;
    }
    tracing::info!(note_id = %record.id, path = %file.path, "linked file to new note");
    Ok(())
}
