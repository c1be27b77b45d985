//! End-of-run counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pull phase counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullCounters {
    pub created: usize,
    pub updated: usize,
    pub moved: usize,
    pub skipped_no_change: usize,
    /// Local file differs and is newer; left for the push phase.
    pub kept_local: usize,
    pub skipped_empty: usize,
    pub orphans_deleted: usize,
    pub attachments_deleted: usize,
    pub errors: usize,
}

impl PullCounters {
    /// Labelled counter values in display order.
    pub fn entries(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Created", self.created),
            ("Updated", self.updated),
            ("Moved", self.moved),
            ("Skipped (no change)", self.skipped_no_change),
            ("Kept local changes", self.kept_local),
            ("Skipped (empty)", self.skipped_empty),
            ("Orphaned notes deleted", self.orphans_deleted),
            ("Orphaned attachments deleted", self.attachments_deleted),
            ("Errors", self.errors),
        ]
    }
}

/// Push phase counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCounters {
    pub created: usize,
    pub updated: usize,
    pub skipped_no_change: usize,
    pub skipped_no_material_change: usize,
    pub conflicts: usize,
    pub remote_deleted: usize,
    pub potential_duplicates: usize,
    pub cherry_pick_local: usize,
    pub cherry_pick_remote: usize,
    pub cherry_pick_skipped: usize,
    pub cherry_pick_prompts: usize,
    pub errors_analysis: usize,
    pub errors_apply: usize,
    pub errors_commit: usize,
    pub errors_finalize: usize,
}

impl PushCounters {
    pub fn entries(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Created", self.created),
            ("Updated", self.updated),
            ("Skipped (no change)", self.skipped_no_change),
            ("Skipped (no material change)", self.skipped_no_material_change),
            ("Conflicts", self.conflicts),
            ("Skipped (deleted remotely)", self.remote_deleted),
            ("Skipped (potential duplicate)", self.potential_duplicates),
            ("Cherry-pick: kept local", self.cherry_pick_local),
            ("Cherry-pick: kept remote", self.cherry_pick_remote),
            ("Cherry-pick: skipped", self.cherry_pick_skipped),
            ("Cherry-pick: prompts (dry run)", self.cherry_pick_prompts),
            ("Errors (analysis)", self.errors_analysis),
            ("Errors (apply)", self.errors_apply),
            ("Errors (commit)", self.errors_commit),
            ("Errors (finalize)", self.errors_finalize),
        ]
    }

    pub fn errors(&self) -> usize {
        self.errors_analysis + self.errors_apply + self.errors_commit + self.errors_finalize
    }
}

/// Report from one sync cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// False once any note failed
    pub success: bool,
    pub dry_run: bool,
    pub started: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
    pub pull: PullCounters,
    pub push: PushCounters,
    /// True when the batch confirmation was declined
    pub push_cancelled: bool,
    /// Actions taken, prefixed with "[dry-run] Would ..." in a dry run
    pub actions: Vec<String>,
    /// Files that could not be indexed
    pub skipped_files: Vec<String>,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn new(dry_run: bool, started: DateTime<Utc>) -> Self {
        Self {
            success: true,
            dry_run,
            started,
            finished: None,
            pull: PullCounters::default(),
            push: PushCounters::default(),
            push_cancelled: false,
            actions: Vec::new(),
            skipped_files: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Record an action. `done` is the past-tense description, `planned`
    /// the infinitive used in a dry run.
    pub fn action(&mut self, done: impl Into<String>, planned: impl AsRef<str>) {
        if self.dry_run {
            self.actions
                .push(format!("[dry-run] Would {}", planned.as_ref()));
        } else {
            self.actions.push(done.into());
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.success = false;
        self.errors.push(message.into());
    }

    /// Plain-text summary used for the sync log note.
    pub fn summary(&self) -> String {
        let ts = |t: DateTime<Utc>| t.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let mut lines = vec![format!("Sync operation started: {}", ts(self.started))];
        if let Some(finished) = self.finished {
            lines.push(format!("Sync operation completed: {}", ts(finished)));
        }
        lines.push(String::new());
        lines.push("## Pull Summary".to_string());
        lines.extend(
            self.pull
                .entries()
                .into_iter()
                .map(|(label, n)| format!("- {label}: {n}")),
        );
        lines.push(String::new());
        lines.push("## Push Summary".to_string());
        lines.extend(
            self.push
                .entries()
                .into_iter()
                .map(|(label, n)| format!("- {label}: {n}")),
        );
        if self.push_cancelled {
            lines.push("- Push cancelled at confirmation".to_string());
        }
        if !self.errors.is_empty() {
            lines.push(String::new());
            lines.push("## Errors".to_string());
            lines.extend(self.errors.iter().map(|e| format!("- {e}")));
        }
        lines.join("\n")
    }
}
