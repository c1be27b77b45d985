//! SyncEngine implementation
//!
//! The SyncEngine drives one full cycle between the vault and a remote
//! store: snapshot, pull, orphan cleanup, push, sync log.

use std::collections::HashSet;

use chrono::Utc;
use keepvault_fs::{NormalizedPath, VaultLayout};

use super::report::SyncReport;
use super::{pull, push, sync_log};
use crate::Result;
use crate::config::SyncConfig;
use crate::model::NoteRecord;
use crate::placement::PlacementResolver;
use crate::policy::{DecisionProvider, PolicyFlags};
use crate::remote::RemoteStore;
use crate::vault::VaultIndex;

/// Options for one sync cycle
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub skip_pull: bool,
    pub skip_push: bool,
    /// If true, every read and decision happens but nothing is written
    /// locally or remotely. Actions are prefixed with "[dry-run] Would ..."
    pub dry_run: bool,
    /// Rewrite local files from remote on any material difference.
    pub force_pull: bool,
    /// Push local changes even when the remote is newer.
    pub force_push: bool,
    pub cherry_pick: bool,
    /// Non-interactive mode; ambiguous differences abort the run.
    pub automatic: bool,
    pub write_sync_log: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            skip_pull: false,
            skip_push: false,
            dry_run: false,
            force_pull: false,
            force_push: false,
            cherry_pick: false,
            automatic: false,
            write_sync_log: true,
        }
    }
}

impl SyncOptions {
    /// Flags handed to the decision policy.
    ///
    /// Automatic mode never prompts, so it switches cherry-pick off.
    pub fn policy_flags(&self) -> PolicyFlags {
        if self.automatic && self.cherry_pick {
            tracing::warn!("--cherry-pick is ignored in automatic mode");
        }
        PolicyFlags {
            force: self.force_push,
            automatic: self.automatic,
            cherry_pick: self.cherry_pick && !self.automatic,
            dry_run: self.dry_run,
        }
    }

    /// True when push needs no batch confirmation.
    pub fn skips_confirmation(&self) -> bool {
        self.automatic || self.force_push || self.dry_run
    }
}

/// State scoped to one run.
pub(crate) struct RunContext<'a> {
    pub layout: &'a VaultLayout,
    pub config: &'a SyncConfig,
    pub options: &'a SyncOptions,
    pub snapshot: Vec<NoteRecord>,
    pub placement: PlacementResolver,
    pub report: SyncReport,
    /// Remote ids handled by the pull phase.
    pub processed: HashSet<String>,
    /// Remote ids whose pull failed; never orphan candidates.
    pub errored: HashSet<String>,
}

impl RunContext<'_> {
    pub fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    pub fn is_sync_log(&self, note: &NoteRecord) -> bool {
        !note.trashed && note.title == self.config.sync_log.title
    }

    pub fn attachments_dir(&self) -> &str {
        &self.config.vault.attachments_dir
    }
}

/// Engine for reconciling a vault with a remote store
pub struct SyncEngine {
    layout: VaultLayout,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(layout: VaultLayout, config: SyncConfig) -> Self {
        Self { layout, config }
    }

    pub fn layout(&self) -> &VaultLayout {
        &self.layout
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Path of the local sync log mirror.
    pub fn sync_log_path(&self) -> NormalizedPath {
        self.layout.root().join(&self.config.sync_log.file_name)
    }

    /// Scan the vault, leaving out the sync log mirror.
    pub fn index(&self) -> Result<VaultIndex> {
        VaultIndex::build(&self.layout, &[self.sync_log_path()])
    }

    /// Run one sync cycle.
    ///
    /// Per-note failures are recorded in the report and do not stop the run.
    ///
    /// # Errors
    ///
    /// Fails when the remote snapshot or the vault scan cannot be read, and
    /// with [`crate::Error::UnresolvedConflict`] when automatic mode meets a
    /// conflict. In the latter case no remote mutation has happened.
    pub fn run(
        &self,
        store: &mut dyn RemoteStore,
        provider: &mut dyn DecisionProvider,
        options: &SyncOptions,
    ) -> Result<SyncReport> {
        let started = Utc::now();
        tracing::info!(vault = %self.layout.root(), dry_run = options.dry_run, "sync started");

        if !options.dry_run {
            self.layout.ensure_structure()?;
        }

        let snapshot = store.all_notes()?;
        tracing::debug!(notes = snapshot.len(), "fetched remote snapshot");

        let mut ctx = RunContext {
            layout: &self.layout,
            config: &self.config,
            options,
            snapshot,
            placement: PlacementResolver::new(
                self.layout.clone(),
                self.config.placement.max_filename_length,
                self.config.placement.max_collision_suffix,
            ),
            report: SyncReport::new(options.dry_run, started),
            processed: HashSet::new(),
            errored: HashSet::new(),
        };

        let mut index = self.index()?;
        record_unindexed(&mut ctx.report, &index);

        if options.skip_pull {
            tracing::info!("pull skipped");
        } else {
            pull::run(&mut ctx, &mut index);
        }

        if options.skip_push {
            tracing::info!("push skipped");
        } else {
            let index = if options.dry_run || options.skip_pull {
                index
            } else {
                self.index()?
            };
            push::run(&mut ctx, &index, store, provider)?;
        }

        let mut report = ctx.report;
        report.finished = Some(Utc::now());

        let log_wanted = self.config.sync_log.enabled && options.write_sync_log;
        if log_wanted && !options.dry_run {
            if let Err(e) = sync_log::write(&self.layout, &self.config, store, &report) {
                tracing::error!(error = %e, "failed to write sync log");
                report.error(format!("Failed to write sync log: {e}"));
            }
        }

        tracing::info!(
            success = report.success,
            pulled = report.pull.created + report.pull.updated,
            pushed = report.push.created + report.push.updated,
            "sync finished"
        );
        Ok(report)
    }
}

fn record_unindexed(report: &mut SyncReport, index: &VaultIndex) {
    for (path, message) in index.malformed().iter().chain(index.unreadable()) {
        report.skipped_files.push(format!("{path}: {message}"));
    }
    for path in index.duplicates() {
        report
            .skipped_files
            .push(format!("{path}: duplicate note id"));
    }
}
