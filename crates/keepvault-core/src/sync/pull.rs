//! Pull phase: remote snapshot into the vault

use keepvault_fs::{NormalizedPath, io};

use super::engine::RunContext;
use crate::Result;
use crate::detect::{TimestampOrder, detect};
use crate::model::NoteRecord;
use crate::orphan;
use crate::vault::{LocalNoteFile, VaultIndex, render_note};

/// What happened to one remote note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PullOutcome {
    Created,
    Updated { moved: bool },
    Moved,
    KeptLocal,
    Unchanged,
}

/// Pull every note of the snapshot, then remove orphans.
pub(crate) fn run(ctx: &mut RunContext<'_>, index: &mut VaultIndex) {
    let snapshot = std::mem::take(&mut ctx.snapshot);

    for note in &snapshot {
        if ctx.is_sync_log(note) {
            ctx.processed.insert(note.id.clone());
            continue;
        }
        if note.is_empty() {
            tracing::debug!(note_id = %note.id, "skipping empty note");
            ctx.processed.insert(note.id.clone());
            ctx.report.pull.skipped_empty += 1;
            continue;
        }

        match pull_note(ctx, index, note) {
            Ok(outcome) => {
                ctx.processed.insert(note.id.clone());
                let counters = &mut ctx.report.pull;
                match outcome {
                    PullOutcome::Created => counters.created += 1,
                    PullOutcome::Updated { moved } => {
                        counters.updated += 1;
                        if moved {
                            counters.moved += 1;
                        }
                    }
                    PullOutcome::Moved => counters.moved += 1,
                    PullOutcome::KeptLocal => counters.kept_local += 1,
                    PullOutcome::Unchanged => counters.skipped_no_change += 1,
                }
            }
            Err(e) => {
                tracing::error!(note_id = %note.id, error = %e, "failed to pull note");
                ctx.errored.insert(note.id.clone());
                ctx.report.pull.errors += 1;
                ctx.report
                    .error(format!("Pull failed for '{}' ({}): {e}", note.title, note.id));
            }
        }
    }

    let outcome = orphan::reconcile(
        ctx.layout,
        index,
        &snapshot,
        &ctx.processed,
        &ctx.errored,
        ctx.dry_run(),
    );
    for path in &outcome.notes_deleted {
        ctx.placement.release(path);
        ctx.report.action(
            format!("Deleted orphaned note {path}"),
            format!("delete orphaned note {path}"),
        );
    }
    for name in &outcome.attachments_deleted {
        ctx.report.action(
            format!("Deleted orphaned attachment {name}"),
            format!("delete orphaned attachment {name}"),
        );
    }
    ctx.report.pull.orphans_deleted += outcome.notes_deleted.len();
    ctx.report.pull.attachments_deleted += outcome.attachments_deleted.len();
    for error in outcome.errors {
        ctx.report.pull.errors += 1;
        ctx.report.error(error);
    }

    ctx.snapshot = snapshot;
}

fn pull_note(
    ctx: &mut RunContext<'_>,
    index: &VaultIndex,
    note: &NoteRecord,
) -> Result<PullOutcome> {
    let Some(local) = index.get(&note.id) else {
        let path = ctx
            .placement
            .place(&note.title, &note.id, note.trashed, note.archived, None)?;
        write_note(ctx, note, &path)?;
        ctx.report.action(
            format!("Created {path}"),
            format!("create {path} from note {}", note.id),
        );
        return Ok(PullOutcome::Created);
    };

    let changes = detect(note, local);
    let order = TimestampOrder::compare(local.effective_updated(), note.updated());
    let remote_wins = ctx.options.force_pull
        || matches!(
            order,
            TimestampOrder::RemoteNewer | TimestampOrder::LocalMissing | TimestampOrder::BothMissing
        );
    let rewrite = changes.is_material() && remote_wins;

    let (title, trashed, archived) = if rewrite {
        (note.title.clone(), note.trashed, note.archived)
    } else {
        effective_placement(local, note)
    };
    let target = ctx
        .placement
        .place(&title, &note.id, trashed, archived, Some(&local.path))?;
    let moved = target != local.path;

    if moved {
        if !ctx.dry_run() {
            io::move_file(&local.path, &target)?;
        }
        ctx.report.action(
            format!("Moved {} to {target}", local.path),
            format!("move {} to {target}", local.path),
        );
    }

    if rewrite {
        tracing::debug!(note_id = %note.id, reasons = %changes, "remote wins, rewriting file");
        write_note(ctx, note, &target)?;
        ctx.report.action(
            format!("Updated {target} ({changes})"),
            format!("update {target} ({changes})"),
        );
        return Ok(PullOutcome::Updated { moved });
    }

    if moved {
        return Ok(PullOutcome::Moved);
    }
    if changes.is_material() {
        tracing::debug!(note_id = %note.id, reasons = %changes, "local changes kept for push");
        return Ok(PullOutcome::KeptLocal);
    }
    Ok(PullOutcome::Unchanged)
}

/// Title and flags from the local file, falling back to the remote values.
fn effective_placement(local: &LocalNoteFile, note: &NoteRecord) -> (String, bool, bool) {
    let fm = &local.frontmatter;
    let content = local.content();
    let title = if content.title.trim().is_empty() {
        note.title.clone()
    } else {
        content.title
    };
    (
        title,
        fm.trashed.unwrap_or(note.trashed),
        fm.archived.unwrap_or(note.archived),
    )
}

/// Render `note` to `path`, stamping the file with the remote update time.
pub(crate) fn write_note(
    ctx: &RunContext<'_>,
    note: &NoteRecord,
    path: &NormalizedPath,
) -> Result<()> {
    if ctx.dry_run() {
        return Ok(());
    }
    let text = render_note(note, ctx.attachments_dir())?;
    io::write_text(path, &text)?;
    if let Some(updated) = note.updated() {
        io::set_modified_time(path, updated)?;
    }
    tracing::debug!(note_id = %note.id, path = %path, "wrote note");
    Ok(())
}
