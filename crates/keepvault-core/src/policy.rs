//! Push decision policy
//!
//! Maps a local file, its remote counterpart and their differences to one
//! [`SyncAction`]. The policy holds no state; interactive choices are
//! delegated to a [`DecisionProvider`].

use std::collections::VecDeque;
use std::fmt;

use keepvault_fs::NormalizedPath;

use crate::detect::{ChangeSet, TimestampOrder};
use crate::model::NoteRecord;
use crate::normalize::collapse_whitespace;
use crate::sync::PushPlan;
use crate::vault::LocalNoteFile;
use crate::{Error, Result};

/// Run mode flags that influence the decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyFlags {
    pub force: bool,
    pub automatic: bool,
    pub cherry_pick: bool,
    pub dry_run: bool,
}

/// Why a file is not pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// An id-less file whose title matches an active remote note.
    PotentialDuplicate { remote_id: String },
    /// The file's id is not in the remote snapshot.
    RemoteDeleted,
    NoChange,
    /// Only the local timestamp moved.
    NoMaterialChange,
    /// The decision provider chose to skip.
    UserSkipped,
    /// Cherry-pick would have prompted, but this is a dry run.
    DryRunPrompt,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PotentialDuplicate { .. } => "potential_duplicate",
            Self::RemoteDeleted => "remote_deleted",
            Self::NoChange => "no_change",
            Self::NoMaterialChange => "no_material_change",
            Self::UserSkipped => "user_skipped",
            Self::DryRunPrompt => "dry_run_prompt",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with one local file during push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Create a new remote note from the file.
    Create { path: NormalizedPath },
    /// Push local fields to the existing remote note.
    Update {
        note_id: String,
        path: NormalizedPath,
        reasons: ChangeSet,
    },
    Skip {
        path: NormalizedPath,
        reason: SkipReason,
    },
    /// Remote is newer and nothing authorizes overwriting it.
    Conflict {
        note_id: String,
        path: NormalizedPath,
        reasons: ChangeSet,
    },
    /// Replace the local file with the remote version.
    RewriteLocal {
        note_id: String,
        path: NormalizedPath,
    },
}

impl SyncAction {
    pub fn path(&self) -> &NormalizedPath {
        match self {
            Self::Create { path }
            | Self::Update { path, .. }
            | Self::Skip { path, .. }
            | Self::Conflict { path, .. }
            | Self::RewriteLocal { path, .. } => path,
        }
    }

    /// True for actions that mutate the remote store.
    pub fn is_remote_mutation(&self) -> bool {
        matches!(self, Self::Create { .. } | Self::Update { .. })
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { path } => write!(f, "create from {path}"),
            Self::Update {
                note_id,
                path,
                reasons,
            } => write!(f, "update {note_id} from {path} ({reasons})"),
            Self::Skip { path, reason } => write!(f, "skip {path} ({reason})"),
            Self::Conflict {
                note_id,
                path,
                reasons,
            } => write!(f, "conflict on {note_id} at {path} ({reasons})"),
            Self::RewriteLocal { note_id, path } => {
                write!(f, "rewrite {path} from remote {note_id}")
            }
        }
    }
}

/// Answer to a cherry-pick prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Keep the local version and push it.
    Local,
    /// Keep the remote version and rewrite the file.
    Remote,
    Skip,
}

/// Everything a provider needs to ask about one note.
#[derive(Debug, Clone, Copy)]
pub struct CherryPickRequest<'a> {
    pub local: &'a LocalNoteFile,
    pub remote: &'a NoteRecord,
    pub reasons: &'a ChangeSet,
}

/// Source of interactive decisions.
pub trait DecisionProvider {
    /// Pick a side for a note that differs materially.
    fn choose(&mut self, request: &CherryPickRequest<'_>) -> Result<Choice>;

    /// Approve the planned batch of remote mutations.
    fn confirm_batch(&mut self, plan: &PushPlan) -> Result<bool>;
}

/// Provider that answers from a script. Runs out to [`Choice::Skip`].
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    choices: VecDeque<Choice>,
    confirm: bool,
    /// Note ids that were prompted, in order.
    pub prompted: Vec<String>,
    /// Number of batch confirmations requested.
    pub confirmations: usize,
}

impl ScriptedProvider {
    pub fn new(choices: impl IntoIterator<Item = Choice>, confirm: bool) -> Self {
        Self {
            choices: choices.into_iter().collect(),
            confirm,
            prompted: Vec::new(),
            confirmations: 0,
        }
    }

    /// Provider that confirms every batch and never expects a prompt.
    pub fn approving() -> Self {
        Self::new([], true)
    }

    pub fn declining() -> Self {
        Self::new([], false)
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::approving()
    }
}

impl DecisionProvider for ScriptedProvider {
    fn choose(&mut self, request: &CherryPickRequest<'_>) -> Result<Choice> {
        self.prompted.push(request.remote.id.clone());
        Ok(self.choices.pop_front().unwrap_or(Choice::Skip))
    }

    fn confirm_batch(&mut self, _plan: &PushPlan) -> Result<bool> {
        self.confirmations += 1;
        Ok(self.confirm)
    }
}

/// Active remote note whose title matches `candidate`, ignoring case and
/// surrounding whitespace.
pub fn find_duplicate<'a>(candidate: &str, notes: &'a [NoteRecord]) -> Option<&'a NoteRecord> {
    let wanted = collapse_whitespace(candidate).to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    notes
        .iter()
        .find(|n| !n.trashed && collapse_whitespace(&n.title).to_lowercase() == wanted)
}

/// Decide the push action for one local file.
///
/// For a file without an id, `remote` is the duplicate candidate found by
/// [`find_duplicate`]; otherwise it is the remote note with the file's id.
///
/// # Errors
///
/// Returns [`Error::UnresolvedConflict`] in automatic mode when the local
/// side is not demonstrably newer and `force` is not set. Provider failures
/// are passed through.
pub fn decide(
    local: &LocalNoteFile,
    remote: Option<&NoteRecord>,
    changes: &ChangeSet,
    flags: PolicyFlags,
    provider: &mut dyn DecisionProvider,
) -> Result<SyncAction> {
    let path = local.path.clone();

    let Some(note_id) = local.id() else {
        return Ok(match remote {
            Some(existing) => SyncAction::Skip {
                path,
                reason: SkipReason::PotentialDuplicate {
                    remote_id: existing.id.clone(),
                },
            },
            None => SyncAction::Create { path },
        });
    };
    let note_id = note_id.to_string();

    let Some(remote) = remote else {
        return Ok(SyncAction::Skip {
            path,
            reason: SkipReason::RemoteDeleted,
        });
    };

    if changes.is_empty() {
        return Ok(SyncAction::Skip {
            path,
            reason: SkipReason::NoChange,
        });
    }
    if !changes.is_material() {
        return Ok(SyncAction::Skip {
            path,
            reason: SkipReason::NoMaterialChange,
        });
    }

    let local_updated = local.effective_updated();
    let remote_updated = remote.updated();
    let order = TimestampOrder::compare(local_updated, remote_updated);
    let update = || SyncAction::Update {
        note_id: note_id.clone(),
        path: path.clone(),
        reasons: changes.clone(),
    };

    if flags.automatic {
        let local_newer = matches!(
            order,
            TimestampOrder::LocalNewer | TimestampOrder::RemoteMissing
        );
        if flags.force || local_newer {
            return Ok(update());
        }
        return Err(Error::UnresolvedConflict {
            note_id,
            title: remote.title.clone(),
            path,
            reasons: changes.clone(),
            local_updated,
            remote_updated,
        });
    }

    if flags.cherry_pick {
        if flags.dry_run {
            return Ok(SyncAction::Skip {
                path,
                reason: SkipReason::DryRunPrompt,
            });
        }
        let request = CherryPickRequest {
            local,
            remote,
            reasons: changes,
        };
        return Ok(match provider.choose(&request)? {
            Choice::Local => update(),
            Choice::Remote => SyncAction::RewriteLocal { note_id, path },
            Choice::Skip => SyncAction::Skip {
                path,
                reason: SkipReason::UserSkipped,
            },
        });
    }

    match order {
        TimestampOrder::LocalNewer | TimestampOrder::Equal | TimestampOrder::RemoteMissing => {
            Ok(update())
        }
        _ if flags.force => Ok(update()),
        _ => Ok(SyncAction::Conflict {
            note_id,
            path,
            reasons: changes.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Reason, detect};
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn file(text: &str, modified: Option<DateTime<Utc>>) -> LocalNoteFile {
        LocalNoteFile::parse(NormalizedPath::new("/vault/Groceries.md"), text, modified).unwrap()
    }

    fn content_change() -> ChangeSet {
        [Reason::Content].into_iter().collect()
    }

    fn remote(updated: Option<DateTime<Utc>>) -> NoteRecord {
        let note = NoteRecord::text("abc123", "Groceries", "milk\neggs");
        match updated {
            Some(ts) => note.with_updated(ts),
            None => note,
        }
    }

    fn run(
        local: &LocalNoteFile,
        remote: Option<&NoteRecord>,
        changes: &ChangeSet,
        flags: PolicyFlags,
    ) -> Result<SyncAction> {
        decide(local, remote, changes, flags, &mut ScriptedProvider::approving())
    }

    #[test]
    fn id_less_file_without_match_is_created() {
        let local = file("# Idea\nthought", None);
        let notes = vec![NoteRecord::text("x", "Other", "")];
        let dup = find_duplicate(&local.candidate_title(), &notes);

        let action = run(&local, dup, &ChangeSet::default(), PolicyFlags::default()).unwrap();
        assert_eq!(action, SyncAction::Create { path: local.path.clone() });
    }

    #[test]
    fn id_less_file_matching_active_title_is_skipped() {
        let local = file("# Idea\nthought", None);
        let notes = vec![NoteRecord::text("r1", "  idea ", "")];
        let dup = find_duplicate(&local.candidate_title(), &notes);

        let action = run(&local, dup, &ChangeSet::default(), PolicyFlags::default()).unwrap();
        assert_eq!(
            action,
            SyncAction::Skip {
                path: local.path.clone(),
                reason: SkipReason::PotentialDuplicate {
                    remote_id: "r1".to_string()
                },
            }
        );
    }

    #[test]
    fn trashed_notes_are_not_duplicates() {
        let notes = vec![NoteRecord::text("r1", "Idea", "").with_flags(false, false, true)];
        assert!(find_duplicate("Idea", &notes).is_none());
    }

    #[test]
    fn missing_remote_is_remote_deleted() {
        let local = file("---\nid: gone\n---\nbody", None);
        let action = run(&local, None, &content_change(), PolicyFlags::default()).unwrap();
        assert!(matches!(
            action,
            SyncAction::Skip {
                reason: SkipReason::RemoteDeleted,
                ..
            }
        ));
    }

    #[test]
    fn identical_note_is_no_change() {
        let note = remote(Some(ts(2)));
        let local = file("---\nid: abc123\ntitle: Groceries\n---\nmilk\neggs", Some(ts(1)));
        let changes = detect(&note, &local);

        let action = run(&local, Some(&note), &changes, PolicyFlags::default()).unwrap();
        assert!(matches!(
            action,
            SyncAction::Skip {
                reason: SkipReason::NoChange,
                ..
            }
        ));
    }

    #[test]
    fn timestamp_only_is_no_material_change() {
        let note = remote(Some(ts(2)));
        let local = file("---\nid: abc123\ntitle: Groceries\n---\nmilk\neggs", Some(ts(5)));
        let changes = detect(&note, &local);

        let action = run(&local, Some(&note), &changes, PolicyFlags { force: true, ..Default::default() }).unwrap();
        assert!(matches!(
            action,
            SyncAction::Skip {
                reason: SkipReason::NoMaterialChange,
                ..
            }
        ));
    }

    #[rstest]
    #[case::local_newer(Some(3), Some(2), false, "update")]
    #[case::equal(Some(2), Some(2), false, "update")]
    #[case::remote_missing(Some(2), None, false, "update")]
    #[case::remote_newer(Some(1), Some(2), false, "conflict")]
    #[case::remote_newer_forced(Some(1), Some(2), true, "update")]
    #[case::both_missing(None, None, false, "conflict")]
    #[case::both_missing_forced(None, None, true, "update")]
    fn default_mode(
        #[case] local_day: Option<u32>,
        #[case] remote_day: Option<u32>,
        #[case] force: bool,
        #[case] expected: &str,
    ) {
        let note = remote(remote_day.map(ts));
        let local = file("---\nid: abc123\n---\nmilk", local_day.map(ts));
        let flags = PolicyFlags {
            force,
            ..Default::default()
        };

        let action = run(&local, Some(&note), &content_change(), flags).unwrap();
        let kind = match action {
            SyncAction::Update { .. } => "update",
            SyncAction::Conflict { .. } => "conflict",
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(kind, expected);
    }

    #[test]
    fn automatic_mode_pushes_when_local_is_newer() {
        let note = remote(Some(ts(2)));
        let local = file("---\nid: abc123\n---\nmilk", Some(ts(3)));
        let flags = PolicyFlags {
            automatic: true,
            ..Default::default()
        };
        let action = run(&local, Some(&note), &content_change(), flags).unwrap();
        assert!(matches!(action, SyncAction::Update { .. }));
    }

    #[test]
    fn automatic_mode_fails_when_remote_is_newer() {
        let note = remote(Some(ts(2)));
        let local = file("---\nid: abc123\n---\nmilk", Some(ts(1)));
        let flags = PolicyFlags {
            automatic: true,
            ..Default::default()
        };

        let err = run(&local, Some(&note), &content_change(), flags).unwrap_err();
        match err {
            Error::UnresolvedConflict {
                note_id, reasons, ..
            } => {
                assert_eq!(note_id, "abc123");
                assert!(reasons.contains(Reason::Content));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn automatic_mode_equal_timestamps_is_a_conflict() {
        let note = remote(Some(ts(2)));
        let local = file("---\nid: abc123\n---\nmilk", Some(ts(2)));
        let flags = PolicyFlags {
            automatic: true,
            ..Default::default()
        };
        assert!(run(&local, Some(&note), &content_change(), flags).is_err());
    }

    #[test]
    fn automatic_mode_force_overrides() {
        let note = remote(Some(ts(2)));
        let local = file("---\nid: abc123\n---\nmilk", Some(ts(1)));
        let flags = PolicyFlags {
            automatic: true,
            force: true,
            ..Default::default()
        };
        let action = run(&local, Some(&note), &content_change(), flags).unwrap();
        assert!(matches!(action, SyncAction::Update { .. }));
    }

    #[rstest]
    #[case(Choice::Local, "update")]
    #[case(Choice::Remote, "rewrite")]
    #[case(Choice::Skip, "skip")]
    fn cherry_pick_follows_provider(#[case] choice: Choice, #[case] expected: &str) {
        let note = remote(Some(ts(2)));
        let local = file("---\nid: abc123\n---\nmilk", Some(ts(1)));
        let flags = PolicyFlags {
            cherry_pick: true,
            ..Default::default()
        };
        let mut provider = ScriptedProvider::new([choice], true);

        let action = decide(&local, Some(&note), &content_change(), flags, &mut provider).unwrap();
        let kind = match action {
            SyncAction::Update { .. } => "update",
            SyncAction::RewriteLocal { .. } => "rewrite",
            SyncAction::Skip {
                reason: SkipReason::UserSkipped,
                ..
            } => "skip",
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(kind, expected);
        assert_eq!(provider.prompted, vec!["abc123"]);
    }

    #[test]
    fn cherry_pick_dry_run_does_not_prompt() {
        let note = remote(Some(ts(2)));
        let local = file("---\nid: abc123\n---\nmilk", Some(ts(1)));
        let flags = PolicyFlags {
            cherry_pick: true,
            dry_run: true,
            ..Default::default()
        };
        let mut provider = ScriptedProvider::new([Choice::Local], true);

        let action = decide(&local, Some(&note), &content_change(), flags, &mut provider).unwrap();
        assert!(matches!(
            action,
            SyncAction::Skip {
                reason: SkipReason::DryRunPrompt,
                ..
            }
        ));
        assert!(provider.prompted.is_empty());
    }
}
