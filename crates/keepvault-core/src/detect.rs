//! Change detection between a remote note and a local file

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::NoteRecord;
use crate::normalize::{collapse_whitespace, normalize_label};
use crate::vault::{LocalNoteFile, remote_body};
use keepvault_fs::checksum::short_digest;

/// Why a local file differs from its remote note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Content,
    Title,
    Color,
    Pinned,
    Archived,
    Trashed,
    LabelsAdd,
    LabelsRemove,
    TimestampLocalNewer,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Title => "title",
            Self::Color => "color",
            Self::Pinned => "pinned",
            Self::Archived => "archived",
            Self::Trashed => "trashed",
            Self::LabelsAdd => "labels_add",
            Self::LabelsRemove => "labels_remove",
            Self::TimestampLocalNewer => "timestamp_local_newer",
        }
    }

    /// Only a newer local timestamp is not worth pushing on its own.
    pub fn is_material(&self) -> bool {
        !matches!(self, Self::TimestampLocalNewer)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of difference reasons for one note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    reasons: BTreeSet<Reason>,
}

impl ChangeSet {
    pub fn insert(&mut self, reason: Reason) {
        self.reasons.insert(reason);
    }

    pub fn contains(&self, reason: Reason) -> bool {
        self.reasons.contains(&reason)
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// True when any difference was found.
    pub fn differs(&self) -> bool {
        !self.reasons.is_empty()
    }

    /// True when at least one reason justifies a push.
    pub fn is_material(&self) -> bool {
        self.reasons.iter().any(Reason::is_material)
    }

    pub fn iter(&self) -> impl Iterator<Item = Reason> + '_ {
        self.reasons.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }
}

impl FromIterator<Reason> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Reason>>(iter: I) -> Self {
        Self {
            reasons: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.reasons.iter().map(Reason::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

/// Ordering of the local effective timestamp against the remote one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampOrder {
    LocalNewer,
    Equal,
    RemoteNewer,
    /// Local present, remote absent.
    RemoteMissing,
    /// Remote present, local absent.
    LocalMissing,
    BothMissing,
}

impl TimestampOrder {
    pub fn compare(local: Option<DateTime<Utc>>, remote: Option<DateTime<Utc>>) -> Self {
        match (local, remote) {
            (Some(l), Some(r)) if l > r => Self::LocalNewer,
            (Some(l), Some(r)) if l < r => Self::RemoteNewer,
            (Some(_), Some(_)) => Self::Equal,
            (Some(_), None) => Self::RemoteMissing,
            (None, Some(_)) => Self::LocalMissing,
            (None, None) => Self::BothMissing,
        }
    }
}

/// Compare a remote note with its local file.
pub fn detect(remote: &NoteRecord, local: &LocalNoteFile) -> ChangeSet {
    let mut changes = ChangeSet::default();
    let fm = &local.frontmatter;
    let content = local.content();

    let local_digest = short_digest(&content.normalized());
    let remote_digest = short_digest(&crate::normalize::normalize(&remote_body(&remote.content)));
    if local_digest != remote_digest {
        tracing::debug!(note_id = %remote.id, local = %local_digest, remote = %remote_digest, "content digest mismatch");
        changes.insert(Reason::Content);
    }

    match TimestampOrder::compare(local.effective_updated(), remote.updated()) {
        TimestampOrder::LocalNewer | TimestampOrder::RemoteMissing => {
            changes.insert(Reason::TimestampLocalNewer);
        }
        _ => {}
    }

    let local_title = collapse_whitespace(&content.title);
    if !local_title.is_empty() && local_title != collapse_whitespace(&remote.title) {
        changes.insert(Reason::Title);
    }

    match fm.color_value() {
        Ok(color) if color != remote.color => changes.insert(Reason::Color),
        Ok(_) => {}
        Err(name) => {
            tracing::warn!(note_id = %remote.id, color = name, "ignoring unknown local colour");
        }
    }

    if fm.is_pinned() != remote.pinned {
        changes.insert(Reason::Pinned);
    }
    if fm.is_archived() != remote.archived {
        changes.insert(Reason::Archived);
    }
    if fm.is_trashed() != remote.trashed {
        changes.insert(Reason::Trashed);
    }

    let (to_add, to_remove) = label_delta(&fm.tags, &remote.labels);
    if !to_add.is_empty() {
        changes.insert(Reason::LabelsAdd);
    }
    if !to_remove.is_empty() {
        changes.insert(Reason::LabelsRemove);
    }

    if changes.differs() {
        tracing::debug!(note_id = %remote.id, reasons = %changes, "detected differences");
    }
    changes
}

/// Normalized labels present locally but not remotely, and the reverse.
pub fn label_delta<'a, L, R>(local: L, remote: R) -> (BTreeSet<String>, BTreeSet<String>)
where
    L: IntoIterator<Item = &'a String>,
    R: IntoIterator<Item = &'a String>,
{
    let local: HashSet<String> = local.into_iter().map(|l| normalize_label(l)).collect();
    let remote: HashSet<String> = remote.into_iter().map(|l| normalize_label(l)).collect();
    let to_add = local.difference(&remote).cloned().collect();
    let to_remove = remote.difference(&local).cloned().collect();
    (to_add, to_remove)
}
